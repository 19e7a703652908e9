use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = dir_edit::cli::parse();
    app::run(args)
}
