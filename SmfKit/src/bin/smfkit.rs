fn main() -> anyhow::Result<()> {
    smfkit::cli::run_cli()
}
