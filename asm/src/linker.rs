use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    rc::Rc,
};

use arch::{device::Extension, MEMORY_SIZE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    block::{Block, Emit},
    error::Error,
    library::{LibRef, Library},
    parser,
    registry::Registry,
    yaml,
};

/// Word of the image under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Word(u16),
    /// Base address of a block, known once it has been compiled.
    Block(String),
}

/// Identity of a gathered library.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LibKey {
    Named(String),
    File(PathBuf),
    Root(usize),
}

/// Layout of a linked image, written next to the binary.
#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolMap {
    pub blocks: IndexMap<String, BlockEntry>,
    pub labels: IndexMap<String, u16>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockEntry {
    pub addr: u16,
    pub size: usize,
}

pub struct Linker {
    registry: Registry,
    memory: Vec<Slot>,
    blocks: IndexMap<String, Block>,
    /// Base address of every compiled block.
    seen: IndexMap<String, u16>,
    sizes: IndexMap<String, usize>,
    seen_libs: HashSet<LibKey>,
    files: IndexMap<PathBuf, Rc<Library>>,
    extensions: Vec<Extension>,
    symbols: IndexMap<String, u16>,
}

impl Linker {
    pub fn new(registry: Registry) -> Self {
        Linker {
            registry,
            memory: vec![],
            blocks: IndexMap::new(),
            seen: IndexMap::new(),
            sizes: IndexMap::new(),
            seen_libs: HashSet::new(),
            files: IndexMap::new(),
            extensions: vec![],
            symbols: IndexMap::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Gather

    /// Merge the blocks and extensions of `library` and of every library it
    /// depends on. Each library is merged once.
    pub fn gather(&mut self, library: &Library) -> Result<(), Error> {
        let key = LibKey::Root(library as *const Library as usize);
        self.gather_with_key(key, library)
    }

    fn gather_with_key(&mut self, key: LibKey, library: &Library) -> Result<(), Error> {
        if !self.seen_libs.insert(key) {
            return Ok(());
        }
        for (name, block) in &library.blocks {
            self.blocks.insert(name.clone(), block.clone());
        }
        self.extensions.extend(library.extensions.iter().cloned());

        for lib in &library.libraries {
            let (key, dep) = self.find(lib, &library.scope)?;
            self.gather_with_key(key, &dep)?;
        }
        Ok(())
    }

    fn find(&mut self, lib: &LibRef, scope: &Path) -> Result<(LibKey, Rc<Library>), Error> {
        match lib {
            LibRef::Named(name) => {
                let dep = self.registry.library(name)?;
                Ok((LibKey::Named(name.clone()), dep))
            }
            LibRef::Path(path) => {
                let full = scope.join(path);
                let full = full
                    .canonicalize()
                    .map_err(|e| Error::FileOpen(full.display().to_string(), e))?;
                let dep = match self.files.get(&full) {
                    Some(dep) => dep.clone(),
                    None => {
                        let dep = Rc::new(self.load_file(&full)?);
                        self.files.insert(full.clone(), dep.clone());
                        dep
                    }
                };
                Ok((LibKey::File(full), dep))
            }
        }
    }

    /// Load a library file; the extension selects the front end.
    pub fn load_file(&self, path: &Path) -> Result<Library, Error> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("asm") => parser::parse_file(path),
            Some("yaml") | Some("yml") => yaml::load_file(path, &self.registry),
            _ => Err(Error::UnknownLibraryFormat(path.display().to_string())),
        }
    }

    // ------------------------------------------------------------------------
    // Compile

    /// Gather `library` and compile everything reachable from `entry`.
    pub fn compile(&mut self, library: &Library, entry: &str) -> Result<(), Error> {
        self.gather(library)?;
        let block = self
            .blocks
            .get(entry)
            .cloned()
            .ok_or_else(|| Error::MissingBlock(entry.to_string()))?;
        self.compile_block(entry, &block)
    }

    /// Append `block` at the end of the image, followed by every block it
    /// references that has not been compiled yet.
    pub fn compile_block(&mut self, name: &str, block: &Block) -> Result<(), Error> {
        let start = self.memory.len();
        let base = u16::try_from(start).map_err(|_| Error::ImageTooLarge(start))?;
        self.seen.insert(name.to_string(), base);

        let (words, labels) = block.to_machine()?;
        let mut pending: Vec<String> = vec![];
        for word in words {
            match word {
                Emit::External(target) => {
                    if !self.seen.contains_key(&target) && !pending.contains(&target) {
                        pending.push(target.clone());
                    }
                    self.memory.push(Slot::Block(target));
                }
                Emit::Local(offset) => {
                    let addr = base
                        .checked_add(offset)
                        .ok_or_else(|| Error::AddressOverflow(name.to_string()))?;
                    self.memory.push(Slot::Word(addr));
                }
                Emit::Lit(v) => self.memory.push(Slot::Word(v)),
            }
        }
        self.sizes.insert(name.to_string(), self.memory.len() - start);

        for (label, offset) in labels {
            let symbol = format!("{}_{}", name, label);
            let addr = base
                .checked_add(offset)
                .ok_or_else(|| Error::AddressOverflow(symbol.clone()))?;
            self.symbols.insert(symbol, addr);
        }

        for target in pending {
            if self.seen.contains_key(&target) {
                continue;
            }
            let block = self
                .blocks
                .get(&target)
                .cloned()
                .ok_or_else(|| Error::MissingBlock(target.clone()))?;
            self.compile_block(&target, &block)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Output

    /// The flat image with every block reference replaced by its address.
    pub fn finalize(&self) -> Result<Vec<u16>, Error> {
        if self.memory.len() > MEMORY_SIZE {
            return Err(Error::ImageTooLarge(self.memory.len()));
        }
        self.memory
            .iter()
            .map(|slot| match slot {
                Slot::Word(v) => Ok(*v),
                Slot::Block(name) => self
                    .seen
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::Unresolved(name.clone())),
            })
            .collect()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// `"{block}_{label}"` to absolute address.
    pub fn symbols(&self) -> &IndexMap<String, u16> {
        &self.symbols
    }

    /// Base address of every compiled block, in compilation order.
    pub fn bases(&self) -> &IndexMap<String, u16> {
        &self.seen
    }

    /// Name of a block starting at `addr`, or else of a label there.
    pub fn symbol_at(&self, addr: u16) -> Option<&str> {
        self.seen
            .iter()
            .chain(self.symbols.iter())
            .find(|(_, a)| **a == addr)
            .map(|(name, _)| name.as_str())
    }

    pub fn symbol_map(&self) -> SymbolMap {
        let blocks = self
            .seen
            .iter()
            .map(|(name, addr)| {
                let size = self.sizes.get(name).copied().unwrap_or(0);
                (name.clone(), BlockEntry { addr: *addr, size })
            })
            .collect();
        SymbolMap {
            blocks,
            labels: self.symbols.clone(),
        }
    }

    /// Hex listing of the image, eight words per row.
    pub fn dump(&self) -> Result<String, Error> {
        let image = self.finalize()?;
        let rows: Vec<String> = image
            .chunks(8)
            .enumerate()
            .map(|(i, row)| {
                let words: Vec<String> = row.iter().map(|w| format!("{:04x}", w)).collect();
                format!("{:04x}: {}", i * 8, words.join(" "))
            })
            .collect();
        Ok(rows.join("\n"))
    }
}
