//! Function recognizers: hooks that inspect lifted IL of a newly discovered
//! function and may claim it (for example to mark it as a known thunk or
//! library routine).
//!
//! Recognizers are registered either globally or for one architecture. For a
//! function on architecture `A`, the recognizers bound to `A` run first, then
//! the global ones, each list in registration order. The first recognizer to
//! return `true` ends the dispatch.

use crate::core::architecture::Architecture;
use crate::core::il_source::{IlInstruction, IlLevel, IlSourceLocation};
use crate::core::view::BinaryView;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace, warn};

/// A discovered function.
#[derive(Debug, Clone)]
pub struct Function {
    pub start: u64,
    pub architecture: Option<Arc<Architecture>>,
}

impl Function {
    pub fn new(start: u64, architecture: Option<Arc<Architecture>>) -> Self {
        Self {
            start,
            architecture,
        }
    }
}

/// Lifted IL of one function. The instruction bodies are owned by the
/// analysis engine; this crate only sees where each instruction came from.
#[derive(Debug, Clone)]
pub struct IlFunction {
    level: IlLevel,
    function_start: u64,
    locations: Vec<IlSourceLocation>,
}

impl IlFunction {
    pub fn new(level: IlLevel, function_start: u64) -> Self {
        Self {
            level,
            function_start,
            locations: Vec::new(),
        }
    }

    /// Build from instruction records; records of a different level are skipped.
    pub fn from_instructions(level: IlLevel, function_start: u64, instrs: &[IlInstruction]) -> Self {
        let locations = instrs
            .iter()
            .filter(|i| i.level == level)
            .map(IlSourceLocation::from)
            .collect();
        Self {
            level,
            function_start,
            locations,
        }
    }

    pub fn push(&mut self, location: IlSourceLocation) {
        self.locations.push(location);
    }

    pub fn level(&self) -> IlLevel {
        self.level
    }

    pub fn function_start(&self) -> u64 {
        self.function_start
    }

    pub fn locations(&self) -> &[IlSourceLocation] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// A function recognizer. Both hooks decline by default.
pub trait FunctionRecognizer: Send + Sync {
    fn recognize_low_level_il(&self, view: &Arc<BinaryView>, func: &Function, il: &IlFunction) -> bool {
        let _ = (view, func, il);
        false
    }

    fn recognize_medium_level_il(
        &self,
        view: &Arc<BinaryView>,
        func: &Function,
        il: &IlFunction,
    ) -> bool {
        let _ = (view, func, il);
        false
    }
}

#[derive(Default)]
struct RecognizerTables {
    global: Vec<Arc<dyn FunctionRecognizer>>,
    by_architecture: HashMap<String, Vec<Arc<dyn FunctionRecognizer>>>,
}

/// Registry of function recognizers.
#[derive(Default)]
pub struct FunctionRecognizers {
    tables: RwLock<RecognizerTables>,
}

static GLOBAL_RECOGNIZERS: Lazy<Arc<FunctionRecognizers>> =
    Lazy::new(|| Arc::new(FunctionRecognizers::new()));

impl FunctionRecognizers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<FunctionRecognizers> {
        Arc::clone(&GLOBAL_RECOGNIZERS)
    }

    pub fn register_global<R>(&self, recognizer: R)
    where
        R: FunctionRecognizer + 'static,
    {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.global.push(Arc::new(recognizer));
        debug!(count = tables.global.len(), "Registered global function recognizer");
    }

    pub fn register_for_architecture<R>(&self, arch: &Architecture, recognizer: R)
    where
        R: FunctionRecognizer + 'static,
    {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let list = tables.by_architecture.entry(arch.name.clone()).or_default();
        list.push(Arc::new(recognizer));
        debug!(arch = %arch.name, count = list.len(), "Registered architecture function recognizer");
    }

    pub fn global_count(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).global.len()
    }

    pub fn architecture_count(&self, arch: &Architecture) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .by_architecture
            .get(&arch.name)
            .map_or(0, Vec::len)
    }

    /// Offer `il` to the recognizers for `func`. Returns `true` once any
    /// recognizer claims the function. High-level IL has no hook and is
    /// never claimed.
    pub fn recognize(&self, view: &Arc<BinaryView>, func: &Function, il: &IlFunction) -> bool {
        if il.level() == IlLevel::HighLevel {
            return false;
        }

        let chain: Vec<Arc<dyn FunctionRecognizer>> = {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            let arch_specific = func
                .architecture
                .as_ref()
                .and_then(|a| tables.by_architecture.get(&a.name))
                .into_iter()
                .flatten();
            arch_specific.chain(tables.global.iter()).cloned().collect()
        };

        for (position, recognizer) in chain.iter().enumerate() {
            let claimed = catch_unwind(AssertUnwindSafe(|| match il.level() {
                IlLevel::LowLevel => recognizer.recognize_low_level_il(view, func, il),
                IlLevel::MediumLevel => recognizer.recognize_medium_level_il(view, func, il),
                IlLevel::HighLevel => false,
            }));
            match claimed {
                Ok(true) => {
                    trace!(start = func.start, level = ?il.level(), position, "Function claimed by recognizer");
                    return true;
                }
                Ok(false) => {}
                Err(_) => {
                    warn!(start = func.start, level = ?il.level(), position, "Function recognizer panicked; treating as declined");
                }
            }
        }
        false
    }
}

/// Register a recognizer for every architecture on the global registry.
pub fn register_global_function_recognizer<R>(recognizer: R)
where
    R: FunctionRecognizer + 'static,
{
    GLOBAL_RECOGNIZERS.register_global(recognizer);
}

/// Register a recognizer for one architecture on the global registry.
pub fn register_architecture_function_recognizer<R>(arch: &Architecture, recognizer: R)
where
    R: FunctionRecognizer + 'static,
{
    GLOBAL_RECOGNIZERS.register_for_architecture(arch, recognizer);
}
