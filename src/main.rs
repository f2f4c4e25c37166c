use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{App, Arg};

use hord::build::build_site;
use hord::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = App::new("hord")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the site by pulling its content from the content service")
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .required(true)
                .help("The directory into which the site is rendered"),
        )
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .help("The project directory (defaults to the current directory)"),
        )
        .arg(
            Arg::with_name("tag")
                .short("t")
                .long("tag")
                .takes_value(true)
                .multiple(true)
                .help("Toggles a tag filter on the list pages; repeatable"),
        )
        .arg(
            Arg::with_name("rotation")
                .long("rotation")
                .takes_value(true)
                .help("Overrides the configured placeholder-image rotation counter"),
        )
        .get_matches();

    let project_directory = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let rotation = match matches.value_of("rotation") {
        Some(rotation) => Some(rotation.parse().context("Parsing --rotation")?),
        None => None,
    };
    let tags: Vec<String> = matches
        .values_of("tag")
        .map(|values| values.map(str::to_owned).collect())
        .unwrap_or_default();

    let config = Config::from_directory(
        &project_directory,
        Path::new(matches.value_of("output").unwrap()),
        rotation,
    )?;

    build_site(&config, &tags).await?;
    Ok(())
}
