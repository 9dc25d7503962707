use std::{ops::RangeInclusive, rc::Rc};

use arch::device::{Device, Extension};
use indexmap::IndexMap;

use crate::{error::Error, library::Library};

/// Builds a device from its constructor arguments.
pub type DeviceCtor = Rc<dyn Fn(&[u16]) -> Box<dyn Device>>;

/// Built-in libraries and devices available to a link.
#[derive(Clone, Default)]
pub struct Registry {
    libraries: IndexMap<String, Rc<Library>>,
    devices: IndexMap<String, DeviceCtor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, library: Library) -> &mut Self {
        self.libraries.insert(name.to_string(), Rc::new(library));
        self
    }

    pub fn library(&self, name: &str) -> Result<Rc<Library>, Error> {
        self.libraries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoLibrary(name.to_string()))
    }

    pub fn device(
        &mut self,
        name: &str,
        ctor: impl Fn(&[u16]) -> Box<dyn Device> + 'static,
    ) -> &mut Self {
        self.devices.insert(name.to_string(), Rc::new(ctor));
        self
    }

    /// Extension descriptor for the device registered as `name`, built with
    /// `args` whenever it is installed.
    pub fn extension(
        &self,
        name: &str,
        range: RangeInclusive<u16>,
        args: Vec<u16>,
    ) -> Result<Extension, Error> {
        let ctor = self
            .devices
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoDevice(name.to_string()))?;
        Ok(Extension::new(name, range, move || ctor(&args)))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("libraries", &self.libraries.keys().collect::<Vec<_>>())
            .field("devices", &self.devices.keys().collect::<Vec<_>>())
            .finish()
    }
}
