use clap::Parser;
use color_print::cprintln;

use ncemu::{
    hooks::{dump::Dump, trace::Trace, Hook},
    Emulator, Error, Stop,
};

#[derive(Parser, Debug)]
#[clap(name = "ncemu", version, about = "Emulator for the NC16 architecture")]
struct Args {
    /// Stop after this many instructions
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    /// YAML map from PC to the state to dump there
    #[arg(short, long)]
    dump_cfg: Option<String>,

    /// Dump registers before every instruction
    #[arg(short = 'a', long)]
    dump_all: bool,

    /// Print every instruction
    #[arg(long)]
    trace: bool,

    #[arg(default_value = "main.bin")]
    input_file: String,
}

/// Little-endian words; a trailing odd byte is ignored.
fn load_image(path: &str) -> Result<Vec<u16>, Error> {
    let bytes = std::fs::read(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn run(args: Args) -> Result<(), Error> {
    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    let image = load_image(&args.input_file)?;
    let mut emu = Emulator::new(&image)?;

    println!("[INIT]");
    let mut hooks: Vec<Box<dyn Hook>> = vec![Box::new(Dump::arg(args.dump_cfg, args.dump_all)?)];
    if args.trace {
        hooks.push(Box::new(Trace));
    }
    for hook in hooks.iter_mut() {
        hook.init(&emu);
    }

    let mut time: u64 = 0;
    let stop = emu.run_until(|emu| {
        if matches!(args.tmax, Some(t) if time >= t) {
            return true;
        }
        for hook in hooks.iter_mut() {
            hook.exec(time, emu);
        }
        time += 1;
        false
    })?;

    println!("=================================================");
    match stop {
        Stop::Halted => cprintln!("<g>halted</> at {:0>4X}", emu.pc()),
        Stop::Cancelled => cprintln!("<y>stopped</> at {:0>4X}", emu.pc()),
    }
    println!("{} instructions, {} cycles", time, emu.cycles());
    Ok(())
}

fn main() {
    let args = Args::parse();
    println!("NC16 Emulator");
    if let Err(err) = run(args) {
        err.print_diag();
        std::process::exit(1);
    }
}
