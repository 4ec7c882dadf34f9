//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    fs, io,
    path::{Path, PathBuf},
    process,
};

use jack::{driver, prelude::*, IMPL_VERSION};
use log::{debug, error, info};

static USAGE: &str = r#"
usage: jackc CMD [OPTIONS] PATH

commands:
    build   Compile a .jack file, or every .jack file in a directory
    tokens  Write the token XML of a .jack file, or of a directory
    tree    Write the parse tree XML of a .jack file, or of a directory
    dump    Print the VM code of one .jack file

options:
    --config FILE   Load compiler configuration from a YAML file
    --out DIR       Write output files into DIR
    --tokens        Also write token XML when building
    --tree          Also write parse tree XML when building

examples:
    jackc build Pong
    jackc build --out build --tokens Pong
    jackc tokens Square/Main.jack
    jackc tree --out build Square
    jackc dump Main.jack
"#;

fn build(path: PathBuf, conf: &CompilerConf) -> JackResult<()> {
    let outputs = driver::compile_path(&path, conf)?;
    info!("compiled {} files from {}", outputs.len(), path.display());
    Ok(())
}

/// Write one XML file per unit the path names.
fn write_xml<F>(path: PathBuf, conf: &CompilerConf, write_file: F) -> JackResult<()>
where
    F: Fn(&Path, &CompilerConf) -> JackResult<PathBuf>,
{
    if let Some(dir) = &conf.output_dir {
        fs::create_dir_all(dir)?;
    }

    for source in driver::collect_sources(&path)? {
        let out_path = write_file(&source, conf)?;
        info!("wrote {}", out_path.display());
    }

    Ok(())
}

fn dump(filepath: PathBuf) -> JackResult<()> {
    let source_code = driver::read_source(&filepath)?;
    let code = compile_str(source_code)?;

    let stdout = io::stdout();
    let mut writer = VmWriter::new(stdout.lock());
    for instr in code {
        writer.emit(instr)?;
    }
    writer.finish()?;

    Ok(())
}

/// Build the compiler configuration from the optional YAML file,
/// with command line flags taking precedence.
fn load_conf(opts: &Opts) -> Result<CompilerConf, Box<dyn Error>> {
    let mut conf = match &opts.config {
        Some(filepath) => {
            let mut file = fs::File::open(filepath)?;
            let conf: CompilerConf = serde_yaml::from_reader(&mut file)?;
            debug!("loaded configuration: {:#?}", conf);
            conf
        }
        None => CompilerConf::default(),
    };

    if let Some(dir) = &opts.out {
        conf.output_dir = Some(dir.clone());
    }
    if opts.tokens {
        conf.emit_tokens = true;
    }
    if opts.tree {
        conf.emit_tree = true;
    }

    Ok(conf)
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    let (cmd, opts) = match parse_args() {
        Some(parsed) => parsed,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
    };

    let conf = load_conf(&opts)?;

    let result = match cmd {
        Cmd::Build { path } => build(path, &conf),
        Cmd::Tokens { path } => write_xml(path, &conf, |source, conf| driver::write_token_file(source, conf)),
        Cmd::Tree { path } => write_xml(path, &conf, |source, conf| driver::write_tree_file(source, conf)),
        Cmd::Dump { filepath } => dump(filepath),
    };

    if let Err(err) = result {
        error!("{err}");
        process::exit(1)
    }

    Ok(())
}

fn parse_args() -> Option<(Cmd, Opts)> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;

    let mut opts = Opts::default();
    let mut path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => opts.config = Some(consume_arg(&mut args)?.into()),
            "--out" => opts.out = Some(consume_arg(&mut args)?.into()),
            "--tokens" => opts.tokens = true,
            "--tree" => opts.tree = true,
            flag if flag.starts_with("--") => return None,
            _ if path.is_none() => path = Some(PathBuf::from(&arg)),
            // Only one path.
            _ => return None,
        }
    }

    let path = path?;
    match cmd.as_str() {
        "build" => Some((Cmd::Build { path }, opts)),
        "tokens" => Some((Cmd::Tokens { path }, opts)),
        "tree" => Some((Cmd::Tree { path }, opts)),
        "dump" => Some((Cmd::Dump { filepath: path }, opts)),
        _ => None,
    }
}

/// Consumes the value of an option, or `None` when it's missing.
fn consume_arg(args: &mut impl Iterator<Item = String>) -> Option<String> {
    args.next()
}

fn print_usage() {
    println!("jackc v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile file or directory
    Build { path: PathBuf },
    /// Dump tokens as XML
    Tokens { path: PathBuf },
    /// Dump parse tree as XML
    Tree { path: PathBuf },
    /// Print VM code
    Dump { filepath: PathBuf },
}

#[derive(Default)]
struct Opts {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    tokens: bool,
    tree: bool,
}
