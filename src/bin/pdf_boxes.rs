//! Print the page boxes of a PDF as JSON
//!
//! Usage:
//!   cargo run --bin pdf_boxes -- document.pdf
//!   cargo run --bin pdf_boxes -- document.pdf --scale 2.8346 --page 3
//!   cargo run --bin pdf_boxes -- document.pdf --box TrimBox
//!
//! With `--box`, each page also reports the named box after fallback
//! (trim, bleed and art to crop, crop to media).
//!
//! Set `RUST_LOG=debug` to trace xref loading and object resolution.

use pdf_import::document::PdfParser;
use pdf_import::geometry::{BoxType, PageBox, PageBoxes};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

struct BoxesConfig {
    path: PathBuf,
    scale: f64,
    page: Option<usize>,
    box_type: Option<BoxType>,
}

impl BoxesConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut path = None;
        let mut scale = 1.0;
        let mut page = None;
        let mut box_type = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--scale" => {
                    i += 1;
                    let value = args.get(i).ok_or("--scale needs a value")?;
                    scale = value
                        .parse()
                        .map_err(|_| format!("Invalid scale '{}'", value))?;
                },
                "--page" => {
                    i += 1;
                    let value = args.get(i).ok_or("--page needs a value")?;
                    page = Some(
                        value
                            .parse()
                            .map_err(|_| format!("Invalid page number '{}'", value))?,
                    );
                },
                "--box" => {
                    i += 1;
                    let value = args.get(i).ok_or("--box needs a value")?;
                    box_type = Some(
                        BoxType::from_name(value).ok_or_else(|| format!("Unknown page box '{}'", value))?,
                    );
                },
                other if path.is_none() => path = Some(PathBuf::from(other)),
                other => return Err(format!("Unexpected argument '{}'", other)),
            }
            i += 1;
        }

        Ok(Self {
            path: path.ok_or("Usage: pdf_boxes <file.pdf> [--scale K] [--page N] [--box NAME]")?,
            scale,
            page,
            box_type,
        })
    }
}

#[derive(Serialize)]
struct PageReport {
    page: usize,
    rotation: i64,
    #[serde(flatten)]
    boxes: PageBoxes,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<SelectedBox>,
}

#[derive(Serialize)]
struct SelectedBox {
    requested: BoxType,
    used: BoxType,
    #[serde(rename = "box")]
    page_box: PageBox,
}

#[derive(Serialize)]
struct Report {
    file: String,
    page_count: usize,
    pages: Vec<PageReport>,
}

fn run(config: &BoxesConfig) -> Result<Report, Box<dyn std::error::Error>> {
    let mut parser = PdfParser::open(&config.path)?;
    let page_count = parser.page_count();

    let numbers = match config.page {
        Some(n) => vec![n],
        None => (1..=page_count).collect(),
    };

    let mut pages = Vec::with_capacity(numbers.len());
    for number in numbers {
        parser.set_page_number(number);
        let selected = match config.box_type {
            Some(requested) => parser
                .page_box(number, requested, config.scale)?
                .map(|page_box| SelectedBox {
                    requested,
                    used: parser.last_used_page_box(),
                    page_box,
                }),
            None => None,
        };
        pages.push(PageReport {
            page: number,
            rotation: parser.page_rotation(number)?,
            boxes: parser.page_boxes(number, config.scale)?,
            selected,
        });
    }

    Ok(Report {
        file: config.path.display().to_string(),
        page_count,
        pages,
    })
}

fn main() {
    env_logger::init();

    let config = match BoxesConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        },
    };

    match run(&config).and_then(|report| Ok(serde_json::to_string_pretty(&report)?)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        },
    }
}
