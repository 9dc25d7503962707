use std::{io::Write, path::PathBuf};

use color_print::cprintln;
use ncasm::{Error, LibRef, Library, Linker, Registry};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input files (.asm, .yaml)
    #[clap(default_value = "main.asm")]
    input: Vec<PathBuf>,

    /// Output file
    #[clap(short, long, default_value = "main.bin")]
    output: PathBuf,

    /// Entry block
    #[clap(short, long, default_value = "main")]
    entry: String,

    /// Write the symbol table as YAML
    #[clap(long)]
    symbols: Option<PathBuf>,

    /// Dump the linked image
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args = Args::parse();
    if let Err(err) = run(&args) {
        err.print_diag();
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    println!("NC16 Assembler");

    println!("1. Read Files");
    let mut root = Library::new();
    for path in &args.input {
        println!("  < {}", path.display());
        let full = path
            .canonicalize()
            .map_err(|e| Error::FileOpen(path.display().to_string(), e))?;
        root.library(LibRef::Path(full));
    }

    println!("2. Link from `{}`", args.entry);
    let mut linker = Linker::new(Registry::new());
    linker.compile(&root, &args.entry)?;
    let image = linker.finalize()?;
    for (name, addr) in linker.bases() {
        cprintln!("  <g>{:04x}</> {}", addr, name);
    }

    println!("3. Generate Binary");
    println!("  > {}", args.output.display());
    let output = args.output.display().to_string();
    let mut file =
        std::fs::File::create(&args.output).map_err(|e| Error::FileCreate(output.clone(), e))?;
    let bytes: Vec<u8> = image.iter().flat_map(|w| w.to_le_bytes()).collect();
    file.write_all(&bytes)
        .map_err(|e| Error::FileWrite(output.clone(), e))?;

    if let Some(path) = &args.symbols {
        println!("  > {}", path.display());
        let name = path.display().to_string();
        let file =
            std::fs::File::create(path).map_err(|e| Error::FileCreate(name.clone(), e))?;
        serde_yaml::to_writer(file, &linker.symbol_map()).map_err(|e| Error::Yaml(name, e))?;
    }

    if args.dump {
        println!("{}", linker.dump()?);
    }
    Ok(())
}
