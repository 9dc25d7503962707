use std::path::{Path, PathBuf};

use arch::device::Extension;
use indexmap::IndexMap;

use crate::{block::Block, error::Error};

/// Reference from one library to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibRef {
    /// Library defined in the [`Registry`](crate::registry::Registry).
    Named(String),
    /// Library file, relative to the scope of the referencing library.
    Path(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    pub blocks: IndexMap<String, Block>,
    pub extensions: Vec<Extension>,
    pub libraries: Vec<LibRef>,
    /// Directory relative paths are resolved against.
    pub scope: PathBuf,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(scope: &Path) -> Self {
        Library {
            scope: scope.to_path_buf(),
            ..Self::default()
        }
    }

    /// Define a block; a block with the same name is replaced.
    pub fn block(
        &mut self,
        name: &str,
        build: impl FnOnce(&mut Block) -> Result<(), Error>,
    ) -> Result<&mut Self, Error> {
        let mut block = Block::new();
        build(&mut block)?;
        self.blocks.insert(name.to_string(), block);
        Ok(self)
    }

    pub fn insert_block(&mut self, name: &str, block: Block) -> &mut Self {
        self.blocks.insert(name.to_string(), block);
        self
    }

    pub fn extension(&mut self, ext: Extension) -> &mut Self {
        self.extensions.push(ext);
        self
    }

    pub fn library(&mut self, lib: LibRef) -> &mut Self {
        self.libraries.push(lib);
        self
    }
}
