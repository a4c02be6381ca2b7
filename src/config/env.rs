use std::collections::HashMap;

use super::EnvSource;

/// Reads values from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed mapping, mostly useful in tests.
impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}
