use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use arch::reg::Reg;
use serde::{Deserialize, Serialize};

use super::Hook;
use crate::{emulator::Emulator, error::Error};

/// Prints machine state when execution reaches configured addresses.
#[derive(Debug)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct List(HashMap<u16, Config>);

#[derive(Debug, Default, Serialize, Deserialize)]
struct Config {
    #[serde(default)]
    regs: bool,
    #[serde(default)]
    stack: bool,
    #[serde(default)]
    heap: Vec<u16>,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, Error> {
        let list = match &file {
            Some(fname) => {
                let f = File::open(fname).map_err(|e| Error::FileOpen(fname.clone(), e))?;
                serde_yaml::from_reader(BufReader::new(f))
                    .map_err(|e| Error::Yaml(fname.clone(), e))?
            }
            None => List::default(),
        };
        Ok(Self { file, all, list })
    }

    pub fn parse(src: &str, all: bool) -> Result<Self, Error> {
        let list = serde_yaml::from_str(src).map_err(|e| Error::Yaml("<dump>".to_string(), e))?;
        Ok(Self {
            file: None,
            all,
            list,
        })
    }

    fn get(&self, pc: u16) -> Option<&Config> {
        self.list.0.get(&pc)
    }

    /// Lines printed at the current PC.
    pub fn render(&self, emu: &Emulator) -> Vec<String> {
        let mut lines = vec![];
        match self.get(emu.pc()) {
            Some(cfg) => {
                if cfg.regs || self.all {
                    lines.extend(Self::reg_lines(emu));
                }
                if cfg.stack {
                    lines.extend(Self::stack_lines(emu));
                }
                lines.extend(Self::heap_lines(emu, &cfg.heap));
            }
            None if self.all => lines.extend(Self::reg_lines(emu)),
            None => {}
        }
        lines
    }

    fn reg_lines(emu: &Emulator) -> Vec<String> {
        let row = |regs: [Reg; 4]| {
            let cells: Vec<String> = regs
                .iter()
                .map(|r| format!("{:>2}: {:0>4X}", r.name(), emu.register(*r)))
                .collect();
            format!(" | {} |", cells.join(" | "))
        };
        vec![
            " +----------+----------+----------+----------+".to_string(),
            row([Reg::A, Reg::B, Reg::C, Reg::X]),
            row([Reg::Y, Reg::Z, Reg::I, Reg::J]),
            row([Reg::PC, Reg::SP, Reg::O, Reg::PEEK]),
            " +----------+----------+----------+----------+".to_string(),
        ]
    }

    /// Words from SP up to the top of memory; the stack is empty when SP is 0.
    fn stack_lines(emu: &Emulator) -> Vec<String> {
        let sp = emu.sp();
        let mut lines: Vec<String> = if sp == 0 {
            vec![" | (empty)".to_string()]
        } else {
            (sp..=0xFFFF)
                .map(|addr| format!(" | {:0>4X} : {:0>4X}", addr, emu.memory()[addr as usize]))
                .collect()
        };
        lines.push(" +---------------------------------------------+".to_string());
        lines
    }

    fn heap_lines(emu: &Emulator, addrs: &[u16]) -> Vec<String> {
        addrs
            .iter()
            .map(|addr| format!(" | {:0>4X} : {:0>4X}", addr, emu.memory()[*addr as usize]))
            .collect()
    }
}

impl Hook for Dump {
    fn init(&mut self, _emu: &Emulator) {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
    }

    fn exec(&mut self, _time: u64, emu: &Emulator) {
        for line in self.render(emu) {
            println!("{}", line);
        }
    }
}
