use elbow::{
    BatchOptions, BatchReport, FilePattern, FileStatus, Job, Policy, RouteConfig, discover,
    run_batch,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Elbow(elbow::Error),
    Json(serde_json::Error),
    Failures(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Elbow(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Failures(n) => write!(f, "{n} file(s) failed"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<elbow::Error> for CliError {
    fn from(value: elbow::Error) -> Self {
        Self::Elbow(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    inputs: Vec<String>,
    out: Option<String>,
    policy: Option<Policy>,
    config: Option<String>,
    pattern: Option<String>,
    dry_run: bool,
    jobs: usize,
    json: bool,
    strict: bool,
    verbosity: i8,
}

fn usage() -> &'static str {
    "elbow\n\
\n\
USAGE:\n\
  elbow [OPTIONS] [<dir>|<file.svg>]...\n\
  elbow [OPTIONS] <input.svg> --out <output.svg>\n\
\n\
OPTIONS:\n\
  --policy directional|attachment   matching/routing policy (default: directional)\n\
  --config <file.json>              overlay layout settings from a JSON file\n\
  --pattern <prefix>*<suffix>       file names picked up in directories (default: diagram-*.svg)\n\
  --out <path>                      write a single input to <path> instead of in place\n\
  --dry-run                         report what would change without writing\n\
  --jobs <n>                        process documents on <n> worker threads\n\
  --json                            print the report as JSON\n\
  --strict                          exit with status 1 if any file failed\n\
  -v, --verbose                     more logging (repeatable; RUST_LOG overrides)\n\
  -q, --quiet                       only print errors\n\
\n\
NOTES:\n\
  - Directories are scanned recursively; files are rewritten in place.\n\
  - With no inputs, the current directory is scanned.\n\
  - Failed files are reported and skipped; the batch always runs to completion.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        jobs: 1,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--dry-run" => args.dry_run = true,
            "--json" => args.json = true,
            "--strict" => args.strict = true,
            "--verbose" | "-v" => args.verbosity = args.verbosity.saturating_add(1),
            "-vv" => args.verbosity = args.verbosity.saturating_add(2),
            "--quiet" | "-q" => args.verbosity = -1,
            "--policy" => {
                let Some(policy) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.policy = Some(
                    policy
                        .parse::<Policy>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--pattern" => {
                let Some(pattern) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.pattern = Some(pattern.clone());
            }
            "--out" | "-o" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--jobs" | "-j" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.jobs = n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?;
                if args.jobs == 0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--" => {
                args.inputs.extend(it.by_ref().cloned());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => args.inputs.push(path.to_string()),
        }
    }

    if args.out.is_some() && args.inputs.len() != 1 {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn init_logging(verbosity: i8) {
    let default_level = match verbosity {
        i8::MIN..=-1 => tracing::Level::ERROR,
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<RouteConfig, CliError> {
    let fallback = args.policy.unwrap_or_default();
    let mut config = match &args.config {
        Some(path) => RouteConfig::from_json_str(&std::fs::read_to_string(path)?, fallback)?,
        None => RouteConfig::for_policy(fallback),
    };
    // An explicit --policy wins over the file, with that policy's selection and style defaults.
    if let Some(policy) = args.policy {
        if policy != config.policy {
            let defaults = RouteConfig::for_policy(policy);
            config.policy = policy;
            config.select_paths = defaults.select_paths;
            config.select_lines = defaults.select_lines;
            config.require_marker_end = defaults.require_marker_end;
            config.style = defaults.style;
        }
    }
    Ok(config)
}

fn collect_jobs(args: &Args) -> Result<Vec<Job>, CliError> {
    if let Some(out) = &args.out {
        let input = PathBuf::from(&args.inputs[0]);
        return Ok(vec![Job {
            input,
            output: PathBuf::from(out),
        }]);
    }

    let pattern = match &args.pattern {
        Some(p) => FilePattern::parse(p)?,
        None => FilePattern::default(),
    };
    let inputs: Vec<&str> = if args.inputs.is_empty() {
        vec!["."]
    } else {
        args.inputs.iter().map(String::as_str).collect()
    };

    let mut jobs = Vec::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            jobs.extend(discover(path, &pattern)?.into_iter().map(Job::in_place));
        } else {
            jobs.push(Job::in_place(path));
        }
    }
    Ok(jobs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(report: &BatchReport, dry_run: bool) {
    for file in &report.files {
        let name = file_name(&file.input);
        match &file.status {
            FileStatus::Changed { fixed, not_fixed } => {
                let verb = if dry_run { "Would fix" } else { "Fixed" };
                if *not_fixed > 0 {
                    println!("  {verb} {fixed} arrows in {name} ({not_fixed} not fixed)");
                } else {
                    println!("  {verb} {fixed} arrows in {name}");
                }
            }
            FileStatus::Skipped { reason, .. } => println!("  Skipping {name}: {reason}"),
            FileStatus::Failed { error } => println!("  Error processing {name}: {error}"),
        }
    }
    println!();
    let verb = if dry_run { "Would fix" } else { "Fixed" };
    println!("{verb} arrows in {} files", report.changed());
    if report.has_failures() {
        println!("{} files failed", report.failed());
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let jobs = collect_jobs(&args)?;
    let show_text = !args.json && args.verbosity >= 0;

    if show_text {
        println!("Found {} diagram SVG files", jobs.len());
        println!("Fixing arrow connections ({} policy)...", config.policy);
        println!();
    }

    let options = BatchOptions {
        dry_run: args.dry_run,
        jobs: args.jobs,
    };
    let report = run_batch(&jobs, &config, options)?;

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
        println!();
    } else if show_text {
        print_report(&report, args.dry_run);
    }

    if args.strict && report.has_failures() {
        return Err(CliError::Failures(report.failed()));
    }
    Ok(())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging(args.verbosity);

    if let Err(err) = run(args) {
        match err {
            CliError::Usage(msg) => {
                eprintln!("{msg}");
                std::process::exit(2);
            }
            err => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
    }
}
