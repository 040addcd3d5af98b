pub mod apply;
pub mod destroy;
pub mod state;

use anyhow::Result;

/// Confirm with user
pub(crate) fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Render an error with its full source chain on one line.
pub(crate) fn render_error(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    rendered
}
