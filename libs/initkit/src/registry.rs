// initkit/src/registry.rs
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use crate::contracts::FeatureStore;

#[derive(Clone)]
pub struct FeatureEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub store: Arc<dyn FeatureStore>,
}

impl std::fmt::Debug for FeatureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .finish()
    }
}

/// Feature stores resolved into dependency levels.
///
/// Stores of one level only depend on stores of earlier levels, so a level can
/// run concurrently once the previous level finished.
pub struct FeatureRegistry {
    levels: Vec<Vec<FeatureEntry>>,
}

impl std::fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let levels: Vec<Vec<&'static str>> = self
            .levels
            .iter()
            .map(|l| l.iter().map(|e| e.name).collect())
            .collect();
        f.debug_struct("FeatureRegistry")
            .field("levels", &levels)
            .finish()
    }
}

impl FeatureRegistry {
    pub fn builder() -> FeatureRegistryBuilder {
        FeatureRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self { levels: Vec::new() }
    }

    pub fn levels(&self) -> &[Vec<FeatureEntry>] {
        &self.levels
    }

    /// Store names in dispatch order.
    pub fn names(&self) -> Vec<&'static str> {
        self.levels.iter().flatten().map(|e| e.name).collect()
    }

    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FeatureStore>> {
        self.levels
            .iter()
            .flatten()
            .find(|e| e.name == name)
            .map(|e| e.store.clone())
    }
}

/// Keys are store **names**; uniqueness enforced at build time.
#[derive(Default)]
pub struct FeatureRegistryBuilder {
    order: Vec<&'static str>,
    stores: HashMap<&'static str, Arc<dyn FeatureStore>>,
    deps: HashMap<&'static str, &'static [&'static str]>,
    errors: Vec<String>,
}

impl FeatureRegistryBuilder {
    pub fn register(
        &mut self,
        name: &'static str,
        deps: &'static [&'static str],
        store: Arc<dyn FeatureStore>,
    ) -> &mut Self {
        if self.stores.contains_key(name) {
            self.errors
                .push(format!("Feature store '{name}' is already registered"));
            return self;
        }
        self.order.push(name);
        self.stores.insert(name, store);
        self.deps.insert(name, deps);
        self
    }

    /// Detect cycles in the dependency graph using DFS with path tracking.
    /// Returns the cycle path if found, None otherwise.
    fn detect_cycle_with_path(
        names: &[&'static str],
        adj: &[Vec<usize>],
    ) -> Option<Vec<&'static str>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White, // unvisited
            Gray,  // on current path
            Black, // finished
        }

        fn dfs(
            node: usize,
            names: &[&'static str],
            adj: &[Vec<usize>],
            colors: &mut [Color],
            path: &mut Vec<usize>,
        ) -> Option<Vec<&'static str>> {
            colors[node] = Color::Gray;
            path.push(node);

            for &next in &adj[node] {
                match colors[next] {
                    Color::Gray => {
                        let start = path.iter().position(|&n| n == next)?;
                        let mut cycle: Vec<&'static str> =
                            path[start..].iter().map(|&i| names[i]).collect();
                        cycle.push(names[next]);
                        return Some(cycle);
                    }
                    Color::White => {
                        if let Some(cycle) = dfs(next, names, adj, colors, path) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }

            path.pop();
            colors[node] = Color::Black;
            None
        }

        let mut colors = vec![Color::White; names.len()];
        let mut path = Vec::new();
        for i in 0..names.len() {
            if colors[i] == Color::White {
                if let Some(cycle) = dfs(i, names, adj, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Validate dependencies and resolve dispatch levels (layered Kahn).
    pub fn build(self) -> Result<FeatureRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration {
                errors: self.errors,
            });
        }

        // Registration order keeps levels deterministic.
        let names = self.order;
        let idx: HashMap<&'static str, usize> =
            names.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut adj = vec![Vec::<usize>::new(); names.len()];
        for (u, &name) in names.iter().enumerate() {
            let deps = self.deps.get(name).copied().unwrap_or_default();
            for &d in deps {
                let v = *idx.get(d).ok_or_else(|| RegistryError::UnknownDependency {
                    store: name.to_string(),
                    depends_on: d.to_string(),
                })?;
                // edge d -> name (dep before dependent)
                adj[v].push(u);
            }
        }

        if let Some(path) = Self::detect_cycle_with_path(&names, &adj) {
            return Err(RegistryError::CycleDetected { path });
        }

        let mut indeg = vec![0usize; names.len()];
        for targets in &adj {
            for &t in targets {
                indeg[t] += 1;
            }
        }

        let mut current: VecDeque<usize> = (0..names.len()).filter(|&i| indeg[i] == 0).collect();
        let mut levels = Vec::new();
        while !current.is_empty() {
            let mut next = VecDeque::new();
            let mut level = Vec::with_capacity(current.len());
            for u in current.drain(..) {
                let name = names[u];
                let store = self
                    .stores
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RegistryError::StoreNotFound(name.to_string()))?;
                level.push(FeatureEntry {
                    name,
                    deps: self.deps.get(name).copied().unwrap_or_default(),
                    store,
                });
                for &w in &adj[u] {
                    indeg[w] -= 1;
                    if indeg[w] == 0 {
                        next.push_back(w);
                    }
                }
            }
            next.make_contiguous().sort_unstable();
            levels.push(level);
            current = next;
        }

        let registry = FeatureRegistry { levels };
        tracing::info!(levels = ?registry, "Feature store dispatch order resolved");
        Ok(registry)
    }
}

/// Structured errors for the feature registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("feature store '{store}' depends on unknown '{depends_on}'")]
    UnknownDependency { store: String, depends_on: String },
    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<&'static str> },
    #[error("feature store not found for '{0}'")]
    StoreNotFound(String),
    #[error("invalid registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
}
