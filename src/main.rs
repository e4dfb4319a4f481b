fn main() {
    #[cfg(feature = "cli")]
    lzmatch::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("lzmatch: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
