use anyhow::{Context, Result};
use simple_logger::SimpleLogger;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use veil_css::callback::{RejectAllCallback, RelativeUriCallback, UriCallback};
use veil_css::config::FilterConfig;
use veil_css::CssFilter;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let matches = clap::Command::new("Veil CSS filter")
        .version("0.1.0")
        .arg(
            clap::Arg::new("path")
                .help("Stylesheet to filter, a directory of stylesheets, or - for stdin")
                .default_value("-")
                .index(1),
        )
        .arg(
            clap::Arg::new("charset")
                .help("Charset the stylesheet is encoded in")
                .long("charset"),
        )
        .arg(
            clap::Arg::new("config")
                .help("Json file with filter settings")
                .long("config"),
        )
        .arg(
            clap::Arg::new("reject-urls")
                .help("Drop every url() and @import")
                .long("reject-urls")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("inline")
                .help("Input is the body of a style attribute")
                .long("inline")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("debug")
                .help("Enable debug logging")
                .short('d')
                .long("debug")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("debug") {
        SimpleLogger::new().init()?;
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => FilterConfig::from_json_file(Path::new(path))?,
        None => FilterConfig::default(),
    };
    if let Some(charset) = matches.get_one::<String>("charset") {
        config.charset = Some(charset.clone());
    }
    if matches.get_flag("inline") {
        config.inline = true;
    }
    log::debug!("filter settings: {config:?}");

    let callback: Box<dyn UriCallback> = if matches.get_flag("reject-urls") {
        Box::new(RejectAllCallback)
    } else {
        Box::new(RelativeUriCallback::new())
    };
    let filter = CssFilter::new(config, callback.as_ref());

    let path = matches
        .get_one::<String>("path")
        .map_or("-", String::as_str);

    if path != "-" && Path::new(path).is_dir() {
        let failed = filter_dir(&filter, Path::new(path));
        if failed > 0 {
            exit(1);
        }
        return Ok(());
    }

    let input = if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).context("cannot read stdin")?;
        buf
    } else {
        fs::read(path).with_context(|| format!("cannot read {path}"))?
    };

    match filter.filter_bytes(&input) {
        Ok(css) => {
            std::io::stdout().write_all(css.as_bytes())?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            exit(1);
        }
    }
}

/// Filters every stylesheet below `dir` and prints one status line per file. Returns the
/// number of files that could not be filtered.
fn filter_dir(filter: &CssFilter, dir: &Path) -> usize {
    let mut files = css_files(dir);
    files.sort();

    let mut failed = 0;
    for file in &files {
        let result = fs::read(file)
            .map_err(anyhow::Error::from)
            .and_then(|buf| Ok(filter.filter_bytes(&buf)?));
        match result {
            Ok(css) => println!("{}: ok ({} bytes)", file.display(), css.len()),
            Err(e) => {
                println!("{}: failed: {e}", file.display());
                failed += 1;
            }
        }
    }

    println!("{} of {} stylesheets filtered.", files.len() - failed, files.len());
    failed
}

fn css_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "css"))
        .map(|entry| entry.into_path())
        .collect()
}
