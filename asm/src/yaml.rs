use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

use crate::{
    block::{Block, Data, DataItem},
    error::Error,
    library::{LibRef, Library},
    parser,
    registry::Registry,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryDef {
    #[serde(default)]
    libraries: Vec<LibRefDef>,
    #[serde(default)]
    extensions: Vec<ExtensionDef>,
    #[serde(default)]
    blocks: IndexMap<String, Vec<Record>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibRefDef {
    name: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtensionDef {
    device: String,
    start: u16,
    end: u16,
    #[serde(default)]
    args: Vec<u16>,
}

/// One entry of a block. `label` may accompany any of the other fields and
/// is placed first.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Record {
    label: Option<String>,
    inst: Option<String>,
    data: Option<Vec<Value>>,
    zero: Option<u16>,
    string: Option<String>,
    call: Option<CallDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CallDef {
    target: String,
    #[serde(default)]
    args: Vec<String>,
}

fn data_item(value: &Value) -> Result<DataItem, Error> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .map(DataItem::Int)
            .ok_or_else(|| Error::UnknownData(n.to_string())),
        Value::String(s) => Ok(DataItem::Str(s.clone())),
        Value::Mapping(map) => match map.get("label") {
            Some(Value::String(name)) if map.len() == 1 => Ok(DataItem::Label(name.clone())),
            _ => Err(Error::UnknownData(format!("{:?}", value))),
        },
        other => Err(Error::UnknownData(format!("{:?}", other))),
    }
}

impl Record {
    fn build(self, block: &mut Block) -> Result<(), Error> {
        if let Some(name) = &self.label {
            block.label(name);
        }

        let contents = [
            self.inst.is_some(),
            self.data.is_some(),
            self.zero.is_some(),
            self.string.is_some(),
            self.call.is_some(),
        ];
        match contents.iter().filter(|c| **c).count() {
            0 if self.label.is_some() => return Ok(()),
            1 => {}
            _ => return Err(Error::UnknownData(format!("{:?}", self))),
        }

        if let Some(src) = self.inst {
            block.inst(parser::parse_instruction(&src)?);
        } else if let Some(values) = self.data {
            let items = values.iter().map(data_item).collect::<Result<Vec<_>, _>>()?;
            block.raw(Data::Words(items));
        } else if let Some(n) = self.zero {
            block.raw(Data::Zero(n));
        } else if let Some(s) = self.string {
            block.raw(Data::Str(s));
        } else if let Some(call) = self.call {
            let target = parser::parse_operand(&call.target)?;
            let args = call
                .args
                .iter()
                .map(|arg| parser::parse_operand(arg))
                .collect::<Result<Vec<_>, _>>()?;
            block.call(target, args)?;
        }
        Ok(())
    }
}

/// Build a library from its YAML description.
pub fn parse(src: &str, file: &str, scope: &Path, registry: &Registry) -> Result<Library, Error> {
    let def: LibraryDef =
        serde_yaml::from_str(src).map_err(|e| Error::Yaml(file.to_string(), e))?;

    let mut lib = Library::with_scope(scope);
    for lib_ref in def.libraries {
        match lib_ref {
            LibRefDef {
                name: Some(name),
                path: None,
            } => lib.library(LibRef::Named(name)),
            LibRefDef {
                name: None,
                path: Some(path),
            } => lib.library(LibRef::Path(path)),
            other => return Err(Error::UnknownData(format!("{:?}", other))),
        };
    }

    for ext in def.extensions {
        lib.extension(registry.extension(&ext.device, ext.start..=ext.end, ext.args)?);
    }

    for (name, records) in def.blocks {
        let mut block = Block::new();
        for record in records {
            record.build(&mut block)?;
        }
        lib.insert_block(&name, block);
    }
    Ok(lib)
}

pub fn load_file(path: &Path, registry: &Registry) -> Result<Library, Error> {
    let name = path.display().to_string();
    let src = std::fs::read_to_string(path).map_err(|e| Error::FileOpen(name.clone(), e))?;
    let scope = path.parent().unwrap_or(Path::new("."));
    parse(&src, &name, scope, registry)
}
