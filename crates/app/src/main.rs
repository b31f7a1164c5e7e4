use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use percept_core::Clock;
use percept_core::model::{Category, FrameKind, PresentationMode};
use services::{
    CropRect, OutputNamer, StimulusPick, StimulusStore, TaskConfig, TaskService, crop, pipeline,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidRect { raw: String },
    InvalidExtension { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw}")
            }
            ArgsError::InvalidRect { raw } => {
                write!(f, "invalid --rect value: {raw} (expected x1,y1,x2,y2)")
            }
            ArgsError::InvalidExtension { raw } => {
                write!(f, "extension must be png or jpg only, got {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Prep,
    Crop,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "prep" => Some(Self::Prep),
            "crop" => Some(Self::Crop),
            _ => None,
        }
    }
}

//
// ─── RUN ARGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    images: PathBuf,
    config: TaskConfig,
    seed: Option<u64>,
    report: Option<PathBuf>,
}

impl RunArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut images = std::env::var("PERCEPT_IMAGES").ok().map(PathBuf::from);
        let mut config = TaskConfig::default();
        let mut seed = None;
        let mut report = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--images" => images = Some(PathBuf::from(require_value(args, "--images")?)),
                "--trials" => {
                    config.trial_count = parse_number(require_value(args, "--trials")?, "--trials")?;
                }
                "--presentation" => config.presentation = require_value(args, "--presentation")?,
                "--category" => config.category = require_value(args, "--category")?,
                "--base-item" => config.base_item = require_value(args, "--base-item")?,
                "--seed" => seed = Some(parse_number(require_value(args, "--seed")?, "--seed")?),
                "--report" => report = Some(PathBuf::from(require_value(args, "--report")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            images: images.ok_or(ArgsError::MissingFlag { flag: "--images" })?,
            config,
            seed,
            report,
        })
    }
}

//
// ─── PREP ARGS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, PartialEq, Eq)]
struct PrepArgs {
    input_dir: PathBuf,
    output_dir: PathBuf,
    pixel_width: u32,
    dark_pad: bool,
    pad_dir: Option<PathBuf>,
}

impl PrepArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut input_dir = None;
        let mut output_dir = None;
        let mut pixel_width = pipeline::STIMULUS_WIDTH;
        let mut dark_pad = false;
        let mut pad_dir = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input-dir" => {
                    input_dir = Some(PathBuf::from(require_value(args, "--input-dir")?));
                }
                "--output-dir" => {
                    output_dir = Some(PathBuf::from(require_value(args, "--output-dir")?));
                }
                "--pixel-width" => {
                    pixel_width =
                        parse_number(require_value(args, "--pixel-width")?, "--pixel-width")?;
                }
                "--dark-pad" => dark_pad = true,
                "--pad-dir" => pad_dir = Some(PathBuf::from(require_value(args, "--pad-dir")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            input_dir: input_dir.ok_or(ArgsError::MissingFlag { flag: "--input-dir" })?,
            output_dir: output_dir.ok_or(ArgsError::MissingFlag {
                flag: "--output-dir",
            })?,
            pixel_width,
            dark_pad,
            pad_dir,
        })
    }
}

//
// ─── CROP ARGS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, PartialEq, Eq)]
struct CropArgs {
    input: PathBuf,
    corners: ((i64, i64), (i64, i64)),
    output_dir: PathBuf,
    output_prefix: String,
    extension: String,
}

impl CropArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut input = None;
        let mut corners = None;
        let mut output_dir = None;
        let mut output_prefix = None;
        let mut extension = "png".to_string();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input" => input = Some(PathBuf::from(require_value(args, "--input")?)),
                "--rect" => corners = Some(parse_rect(&require_value(args, "--rect")?)?),
                "--output-dir" => {
                    output_dir = Some(PathBuf::from(require_value(args, "--output-dir")?));
                }
                "--output-prefix" => output_prefix = Some(require_value(args, "--output-prefix")?),
                "--extension" => {
                    let value = require_value(args, "--extension")?;
                    if value != "png" && value != "jpg" {
                        return Err(ArgsError::InvalidExtension { raw: value });
                    }
                    extension = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            input: input.ok_or(ArgsError::MissingFlag { flag: "--input" })?,
            corners: corners.ok_or(ArgsError::MissingFlag { flag: "--rect" })?,
            output_dir: output_dir.ok_or(ArgsError::MissingFlag {
                flag: "--output-dir",
            })?,
            output_prefix: output_prefix.ok_or(ArgsError::MissingFlag {
                flag: "--output-prefix",
            })?,
            extension,
        })
    }
}

/// Parses `x1,y1,x2,y2` into two drag corners.
fn parse_rect(raw: &str) -> Result<((i64, i64), (i64, i64)), ArgsError> {
    let parts: Vec<i64> = raw
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ArgsError::InvalidRect {
            raw: raw.to_string(),
        })?;
    if parts.len() != 4 {
        return Err(ArgsError::InvalidRect {
            raw: raw.to_string(),
        });
    }
    Ok(((parts[0], parts[1]), (parts[2], parts[3])))
}

//
// ─── HELP ──────────────────────────────────────────────────────────────────────
//

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  app run  --images <dir> [--trials N] [--presentation MODE] [--category C] \
         [--base-item ITEM] [--seed N] [--report <path>]"
    );
    eprintln!(
        "  app prep --input-dir <dir> --output-dir <dir> [--pixel-width N] [--dark-pad] \
         [--pad-dir <dir>]"
    );
    eprintln!(
        "  app crop --input <file> --rect x1,y1,x2,y2 --output-dir <dir> \
         --output-prefix P [--extension png|jpg]"
    );
    eprintln!();
    eprintln!("Defaults for run: --trials 10 --presentation single300 --category fruit --base-item apple");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PERCEPT_IMAGES   default for --images");
}

fn print_category_help() {
    eprintln!("categories that are allowed:");
    for category in Category::ALL {
        eprintln!("\t{}", category.name());
        for item in category.members() {
            eprintln!("\t\t{item}");
        }
    }
    eprintln!("presentation modes that are allowed:");
    for mode in PresentationMode::ALL {
        eprintln!("\t{}", mode.name());
    }
}

/// Configuration problems are operator mistakes, not program failures:
/// report the cause and terminate without signaling an error.
fn exit_invalid(cause: &dyn fmt::Display) -> ! {
    eprintln!("{cause}, EXITING");
    std::process::exit(0);
}

//
// ─── RUN ───────────────────────────────────────────────────────────────────────
//

fn run_session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = match StimulusStore::open(&args.images) {
        Ok(store) => store,
        Err(err) => exit_invalid(&err),
    };

    let clock = Clock::default_clock();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut task = match TaskService::start(&args.config, store, &clock, &mut rng) {
        Ok(task) => task,
        Err(err) if err.is_configuration() => {
            eprintln!("{err}, EXITING");
            print_category_help();
            std::process::exit(0);
        }
        Err(err) => return Err(err.into()),
    };

    println!("Is there a {} in this picture?", task.session().base_item());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    while !task.session().is_complete() {
        let Some(pick) = task.current_stimulus(&mut rng)? else {
            break;
        };
        present(task.presentation(), &pick);

        let said_yes = read_yes_no(&mut input)?;
        let answer = task.answer_current(said_yes, &clock)?;
        log::debug!(
            "trial {} answered, correct={}",
            answer.outcome.index,
            answer.outcome.correct
        );
    }

    let score = task.session().score();
    println!("{}", "*".repeat(80));
    println!("Total Score: {}/{}", score.correct, score.total);
    println!("{}", "*".repeat(80));

    if let Some(path) = args.report {
        fs::write(&path, task.report().to_json()?)?;
        log::info!("session report written to {}", path.display());
    }

    Ok(())
}

/// Plays one trial's timing schedule on the terminal. A stimulus frame
/// prints the image path (also useful for culling bad images by hand); a
/// blank frame prints nothing.
fn present(mode: PresentationMode, pick: &StimulusPick) {
    for frame in mode.schedule() {
        if frame.kind == FrameKind::Stimulus {
            println!("{}", pick.path().display());
        }
        if let Some(ms) = frame.hold_ms {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

fn read_yes_no(input: &mut impl BufRead) -> io::Result<bool> {
    loop {
        print!("[y/n] ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before the session finished",
            ));
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => eprintln!("please answer y or n, got {other:?}"),
        }
    }
}

//
// ─── PREP ──────────────────────────────────────────────────────────────────────
//

fn run_prep(args: PrepArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input_dir.is_dir() {
        exit_invalid(&"input directory not valid");
    }
    fs::create_dir_all(&args.output_dir)?;

    let converted = pipeline::convert_to_png(&args.input_dir, &args.output_dir)?;
    println!(
        "converted {} images ({} skipped)",
        converted.processed, converted.skipped
    );

    let downsampled = pipeline::grayscale_downsample(&args.output_dir, args.pixel_width)?;
    println!(
        "grayscaled and downsampled {} images to {1}x{1}px",
        downsampled.processed, args.pixel_width
    );

    if args.dark_pad {
        let pad_dir = args
            .pad_dir
            .unwrap_or_else(|| args.output_dir.join("padded"));
        fs::create_dir_all(&pad_dir)?;
        let padded = pipeline::dark_pad(&args.output_dir, &pad_dir)?;
        println!(
            "dark-padded {} images ({} skipped)",
            padded.processed, padded.skipped
        );
    }

    Ok(())
}

//
// ─── CROP ──────────────────────────────────────────────────────────────────────
//

fn run_crop(args: CropArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rect = match CropRect::from_corners(args.corners.0, args.corners.1) {
        Ok(rect) => rect,
        Err(err) => exit_invalid(&err),
    };
    fs::create_dir_all(&args.output_dir)?;

    let mut namer = OutputNamer::open(&args.output_dir, args.output_prefix, args.extension)?;
    let out = crop::crop_to_next(&args.input, rect, &mut namer)?;
    println!("saved {}", out.display());
    Ok(())
}

//
// ─── ENTRY POINT ───────────────────────────────────────────────────────────────
//

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => match Command::from_arg(first) {
            Some(cmd) => cmd,
            None => {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::process::exit(0);
            }
        },
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    fn exit_parse(err: &ArgsError) -> ! {
        eprintln!("{err}");
        print_usage();
        std::process::exit(0);
    }
    match cmd {
        Command::Run => match RunArgs::parse(&mut iter) {
            Ok(args) => run_session(args),
            Err(err) => exit_parse(&err),
        },
        Command::Prep => match PrepArgs::parse(&mut iter) {
            Ok(args) => run_prep(args),
            Err(err) => exit_parse(&err),
        },
        Command::Crop => match CropArgs::parse(&mut iter) {
            Ok(args) => run_crop(args),
            Err(err) => exit_parse(&err),
        },
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn strings(args: &[&str]) -> std::vec::IntoIter<String> {
        args.iter()
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn run_args_parse_with_defaults() {
        let mut iter = strings(&["--images", "pics", "--trials", "12", "--seed", "9"]);
        let args = RunArgs::parse(&mut iter).unwrap();
        assert_eq!(args.images, PathBuf::from("pics"));
        assert_eq!(args.config.trial_count, 12);
        assert_eq!(args.config.category, "fruit");
        assert_eq!(args.config.base_item, "apple");
        assert_eq!(args.config.presentation, "single300");
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.report, None);
    }

    #[test]
    fn run_args_reject_unknown_flag() {
        let mut iter = strings(&["--images", "pics", "--bogus"]);
        let err = RunArgs::parse(&mut iter).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(flag) if flag == "--bogus"));
    }

    #[test]
    fn run_args_reject_bad_trial_count() {
        let mut iter = strings(&["--images", "pics", "--trials", "many"]);
        let err = RunArgs::parse(&mut iter).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidNumber { flag: "--trials", .. }));
    }

    #[test]
    fn crop_args_require_extension_png_or_jpg() {
        let mut iter = strings(&[
            "--input", "a.png", "--rect", "0,0,10,10", "--output-dir", "out",
            "--output-prefix", "c", "--extension", "gif",
        ]);
        let err = CropArgs::parse(&mut iter).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidExtension { raw } if raw == "gif"));
    }

    #[test]
    fn rect_parses_four_coordinates() {
        assert_eq!(
            parse_rect("1, 2, 30,40").unwrap(),
            ((1, 2), (30, 40))
        );
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,3,x").is_err());
    }

    #[test]
    fn yes_no_accepts_variants_and_reprompts() {
        let mut input = Cursor::new(b"maybe\nYES\n".to_vec());
        assert!(read_yes_no(&mut input).unwrap());

        let mut input = Cursor::new(b"n\n".to_vec());
        assert!(!read_yes_no(&mut input).unwrap());

        let mut input = Cursor::new(Vec::new());
        assert!(read_yes_no(&mut input).is_err());
    }
}
