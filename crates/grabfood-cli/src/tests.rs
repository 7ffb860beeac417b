use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["grabfood"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_scrape_with_explicit_location() {
    let cli = Cli::try_parse_from(["grabfood", "scrape", "--location", "Tampines, Singapore"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            ref location,
            proxy: false,
            output: None,
        }) if location == "Tampines, Singapore"
    ));
}

#[test]
fn parses_scrape_proxy_and_output() {
    let cli = Cli::try_parse_from([
        "grabfood",
        "scrape",
        "--location",
        "Jurong East",
        "--proxy",
        "--output",
        "/tmp/out.ndjson.gz",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            proxy: true,
            output: Some(ref p),
            ..
        }) if p == std::path::Path::new("/tmp/out.ndjson.gz")
    ));
}

#[test]
fn parses_inspect_path() {
    let cli = Cli::try_parse_from(["grabfood", "inspect", "data.ndjson.gz"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Inspect { ref path }) if path == std::path::Path::new("data.ndjson.gz")
    ));
}

#[test]
fn inspect_requires_path() {
    assert!(Cli::try_parse_from(["grabfood", "inspect"]).is_err());
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["grabfood", "crawl"]).is_err());
}
