use vergen_gitcl::{Emitter, Gitcl};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Branch, short sha and dirty flag feed `version::version_string`.
    let gitcl = Gitcl::builder().branch(true).sha(true).dirty(true).build();

    Emitter::default().add_instructions(&gitcl)?.emit()?;

    Ok(())
}
