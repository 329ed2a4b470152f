use std::sync::Arc;

use anyhow::Result;
use beni_domain::MarkerEnvironment;

use crate::fetch::{DocumentSource, HttpDocumentSource};
use crate::python_sys::{detect_interpreter, detect_marker_environment};

pub trait PythonRuntime: Send + Sync {
    fn detect_interpreter(&self, explicit: Option<&str>) -> Result<String>;
    fn marker_environment(&self, python: &str) -> Result<MarkerEnvironment>;
}

pub trait Effects: Send + Sync {
    fn python(&self) -> &dyn PythonRuntime;
    fn documents(&self) -> &dyn DocumentSource;
}

pub type SharedEffects = Arc<dyn Effects>;

pub struct SystemEffects {
    python: Arc<SystemPythonRuntime>,
    documents: Arc<HttpDocumentSource>,
}

impl SystemEffects {
    pub fn new(keep_proxies: bool) -> Result<Self> {
        Ok(Self {
            python: Arc::new(SystemPythonRuntime),
            documents: Arc::new(HttpDocumentSource::new(keep_proxies)?),
        })
    }
}

impl Effects for SystemEffects {
    fn python(&self) -> &dyn PythonRuntime {
        self.python.as_ref()
    }

    fn documents(&self) -> &dyn DocumentSource {
        self.documents.as_ref()
    }
}

struct SystemPythonRuntime;

impl PythonRuntime for SystemPythonRuntime {
    fn detect_interpreter(&self, explicit: Option<&str>) -> Result<String> {
        detect_interpreter(explicit)
    }

    fn marker_environment(&self, python: &str) -> Result<MarkerEnvironment> {
        detect_marker_environment(python)
    }
}
