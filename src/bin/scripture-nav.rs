use std::env;
use std::process::ExitCode;

use scripture_nav::{
    scan_geotags, ChapterKey, HttpTransport, NavConfig, NavigationIntent, Navigator, RecordingMap,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Catalog,
    Route(String),
    Page(String),
    Chapter {
        book_id: u32,
        chapter: u32,
        verses: Option<String>,
        jst: bool,
    },
    Markers(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Args {
    config_path: Option<String>,
    command: Command,
}

#[derive(Serialize)]
struct RouteOutput {
    hash: String,
    intent: NavigationIntent,
}

#[derive(Serialize)]
struct PageOutput<'a> {
    hash: String,
    page: &'a scripture_nav::Page,
    map: &'a [scripture_nav::MapCall],
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let config = match &cli.config_path {
        Some(path) => NavConfig::load(path).map_err(|e| e.to_string())?,
        None => NavConfig::default(),
    };

    // Marker scanning works on a local file and never touches the network.
    if let Command::Markers(path) = &cli.command {
        let html = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
        let tags = scan_geotags(&html);
        let body = serde_json::to_string_pretty(&tags).map_err(|e| e.to_string())?;
        println!("{}", body);
        return Ok(());
    }

    let transport = HttpTransport::new(&config);
    let mut navigator = Navigator::init(transport, config).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Catalog => {
            let catalog = navigator.catalog();
            for volume in catalog.volumes() {
                println!(
                    "{:>3}  {} (books {}..={}, loaded {})",
                    volume.id,
                    volume.full_name,
                    volume.min_book_id,
                    volume.max_book_id,
                    volume.book_ids.len()
                );
                for book in catalog.books_in(volume) {
                    println!("       {:>4}  {} [{}]", book.id, book.full_name, book.num_chapters);
                }
            }
            println!(
                "volumes={} books={}",
                catalog.volumes().len(),
                catalog.book_count()
            );
        }
        Command::Route(hash) => {
            let intent = scripture_nav::route(&hash, navigator.catalog());
            let out = RouteOutput {
                hash: intent.to_hash(navigator.catalog()),
                intent,
            };
            let body = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
            println!("{}", body);
        }
        Command::Page(hash) => {
            let mut map = RecordingMap::default();
            let page = navigator.on_hash_changed(&hash, &mut map);
            let out = PageOutput {
                hash: page.intent.to_hash(navigator.catalog()),
                page: &page,
                map: &map.calls,
            };
            let body = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
            println!("{}", body);
        }
        Command::Chapter {
            book_id,
            chapter,
            verses,
            jst,
        } => {
            if !navigator.catalog().book_chapter_valid(book_id, chapter) {
                return Err(format!("no chapter {} in book {}", chapter, book_id));
            }
            let html = navigator
                .chapter_text(ChapterKey::new(book_id, chapter), verses.as_deref(), jst)
                .map_err(|e| e.to_string())?;
            println!("{}", html);
        }
        Command::Markers(_) => {}
    }
    Ok(())
}

fn parse_u32(flag: &str, value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("invalid {} value '{}'", flag, value))
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let mut config_path = None;
    let mut verses = None;
    let mut jst = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(v.clone());
                i += 2;
            }
            "--verses" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--verses requires a value".to_string())?;
                verses = Some(v.clone());
                i += 2;
            }
            "--jst" => {
                jst = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{}'", other));
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let mut positional = positional.into_iter();
    let name = positional
        .next()
        .ok_or_else(|| "missing command".to_string())?;
    let mut operand = |what: &str| {
        positional
            .next()
            .ok_or_else(|| format!("{} requires {}", name, what))
    };

    let command = match name.as_str() {
        "catalog" => Command::Catalog,
        // An empty hash is valid input, so `route` and `page` default to it.
        "route" => Command::Route(operand("a hash").unwrap_or_default()),
        "page" => Command::Page(operand("a hash").unwrap_or_default()),
        "chapter" => {
            let book_id = parse_u32("book", &operand("a book id")?)?;
            let chapter = parse_u32("chapter", &operand("a chapter number")?)?;
            Command::Chapter {
                book_id,
                chapter,
                verses: verses.take(),
                jst,
            }
        }
        "markers" => Command::Markers(operand("an html file")?),
        other => return Err(format!("unknown command '{}'", other)),
    };
    if verses.is_some() || (jst && !matches!(command, Command::Chapter { .. })) {
        return Err("--verses and --jst only apply to the chapter command".to_string());
    }
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument '{}'", extra));
    }

    Ok(Args {
        config_path,
        command,
    })
}

fn help_text() -> &'static str {
    r#"scripture-nav - inspect the scriptures catalog and render navigator pages

USAGE:
  cargo run --features cli --bin scripture-nav -- [--config <file>] <command>

COMMANDS:
  catalog                     list volumes and their books
  route <hash>                resolve a hash such as 1:101:3 to a view
  page <hash>                 render the page and map commands for a hash as JSON
  chapter <book> <chapter>    print raw chapter html
  markers <html-file>         list the showLocation geotags in a local html file

OPTIONS:
  --config <file>             JSON config (endpoints, timeout, marker zoom, cache size)
  --verses <range>            verse filter for the chapter command, e.g. 3-5
  --jst                       request the Joseph Smith Translation text
"#
}
