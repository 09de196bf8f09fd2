//! Builtin numeric functions
//!
//! A small registry of math builtins available to every formula. The
//! interpreter consults it only after the program's own function table,
//! so user definitions shadow builtins of the same name.

use ahash::AHashMap;

/// Builtin implementation signature
///
/// Arity is validated by the interpreter before the call, so
/// implementations may index their argument slice freely.
pub type BuiltinImpl = fn(&[f64]) -> f64;

/// Builtin function definition
pub struct BuiltinDef {
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    pub implementation: BuiltinImpl,
}

/// Builtin function registry
///
/// Constructed per interpreter instance; there is no global registry.
pub struct BuiltinRegistry {
    functions: AHashMap<&'static str, BuiltinDef>,
}

impl BuiltinRegistry {
    /// Create a registry with all builtin functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register(BuiltinDef {
            name: "abs",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].abs(),
        });
        registry.register(BuiltinDef {
            name: "sqrt",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].sqrt(),
        });
        registry.register(BuiltinDef {
            name: "pow",
            min_args: 2,
            max_args: Some(2),
            implementation: |args| args[0].powf(args[1]),
        });
        registry.register(BuiltinDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: |args| args.iter().copied().fold(f64::INFINITY, f64::min),
        });
        registry.register(BuiltinDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: |args| args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });
        registry.register(BuiltinDef {
            name: "floor",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].floor(),
        });
        registry.register(BuiltinDef {
            name: "ceil",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].ceil(),
        });
        registry.register(BuiltinDef {
            name: "round",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].round(),
        });
        registry.register(BuiltinDef {
            name: "trunc",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].trunc(),
        });
        registry.register(BuiltinDef {
            name: "sin",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].sin(),
        });
        registry.register(BuiltinDef {
            name: "cos",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].cos(),
        });
        registry.register(BuiltinDef {
            name: "tan",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].tan(),
        });
        registry.register(BuiltinDef {
            name: "atan2",
            min_args: 2,
            max_args: Some(2),
            implementation: |args| args[0].atan2(args[1]),
        });
        registry.register(BuiltinDef {
            name: "log",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].ln(),
        });
        registry.register(BuiltinDef {
            name: "exp",
            min_args: 1,
            max_args: Some(1),
            implementation: |args| args[0].exp(),
        });

        registry
    }

    /// Look up a builtin by name
    pub fn get(&self, name: &str) -> Option<&BuiltinDef> {
        self.functions.get(name)
    }

    fn register(&mut self, def: BuiltinDef) {
        self.functions.insert(def.name, def);
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = BuiltinRegistry::new();
        assert!(registry.get("sqrt").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_variadic_min_max() {
        let registry = BuiltinRegistry::new();
        let min = registry.get("min").unwrap();
        assert_eq!(min.max_args, None);
        assert_eq!((min.implementation)(&[5.0, 2.0, 8.0]), 2.0);

        let max = registry.get("max").unwrap();
        assert_eq!((max.implementation)(&[5.0, 2.0, 8.0]), 8.0);
    }

    #[test]
    fn test_fixed_arity_builtins() {
        let registry = BuiltinRegistry::new();
        let sqrt = registry.get("sqrt").unwrap();
        assert_eq!((sqrt.min_args, sqrt.max_args), (1, Some(1)));
        assert_eq!((sqrt.implementation)(&[16.0]), 4.0);
    }
}
