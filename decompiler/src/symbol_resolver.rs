use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use tokio::task::JoinSet;

use decaf_reader::{class_file::ClassFile, class_reader};

use crate::{
    class_environment::ClassEnvironment,
    class_info::{ClassInfo, Resolution},
};

/// Classifies and resolves class names against the caller's archive. Every
/// outcome is cached in the symbol table, so no name is ever fetched twice
/// within one decompilation.
pub struct SymbolResolver<E: ClassEnvironment> {
    environment: E,
    table: HashMap<String, Resolution>,
}

impl<E: ClassEnvironment> SymbolResolver<E> {
    pub fn new(environment: E) -> Self {
        Self {
            environment,
            table: HashMap::new(),
        }
    }

    pub fn lookup(&self, class_name: &str) -> Option<&Resolution> {
        self.table.get(class_name)
    }

    /// The whole symbol table, for rendering decisions.
    pub fn resolutions(&self) -> &HashMap<String, Resolution> {
        &self.table
    }

    /// Seeds the table with an already-parsed class, so references back to
    /// it never trigger another fetch.
    pub fn register(&mut self, class_file: &ClassFile) {
        self.table.insert(
            class_file.name.clone(),
            Resolution::Internal(ClassInfo::from_class_file(class_file)),
        );
    }

    /// Resolves one name, caching the outcome. Names outside the archive
    /// are marked external without fetching; names inside it are fetched
    /// and parsed, with absence and parse failures marked unresolved.
    pub async fn resolve(&mut self, class_name: &str) -> Resolution {
        if let Some(cached) = self.table.get(class_name) {
            return cached.clone();
        }
        if !self.environment.is_known(class_name) {
            debug!("{class_name} is not part of the archive, marking it external");
            self.table
                .insert(class_name.to_string(), Resolution::External);
            return Resolution::External;
        }

        // The stub makes a re-entrant request for this name return
        // immediately instead of fetching again
        self.table
            .insert(class_name.to_string(), Resolution::InProgress);
        let bytes = self.environment.fetch(class_name).await;
        let resolution = Self::resolution_of(class_name, bytes);
        self.table
            .insert(class_name.to_string(), resolution.clone());
        resolution
    }

    /// Resolves a name and walks up through its superclasses and
    /// interfaces, so the whole inheritance chain ends up in the table.
    /// The visited set keeps adversarial inheritance cycles finite.
    pub async fn resolve_hierarchy(&mut self, class_name: &str) -> Resolution {
        let mut pending = vec![class_name.to_string()];
        let mut visited = HashSet::new();
        let mut first = None;
        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let resolution = self.resolve(&name).await;
            if let Resolution::Internal(info) = &resolution {
                if let Some(superclass) = &info.superclass {
                    pending.push(superclass.clone());
                }
                pending.extend(info.interfaces.iter().cloned());
            }
            if first.is_none() {
                first = Some(resolution);
            }
        }
        first.unwrap_or(Resolution::Unresolved)
    }

    /// Resolves a batch of names concurrently. Fetches run as one task per
    /// name; outcomes are applied in name order, so the table never depends
    /// on completion order.
    pub async fn resolve_batch(&mut self, class_names: &BTreeSet<String>) {
        let mut fetches = JoinSet::new();
        let mut spawned = BTreeSet::new();
        for name in class_names {
            if self.table.contains_key(name) {
                continue;
            }
            if !self.environment.is_known(name) {
                debug!("{name} is not part of the archive, marking it external");
                self.table.insert(name.clone(), Resolution::External);
                continue;
            }
            self.table.insert(name.clone(), Resolution::InProgress);
            spawned.insert(name.clone());
            let environment = self.environment.clone();
            let name = name.clone();
            fetches.spawn(async move {
                let bytes = environment.fetch(&name).await;
                (name, bytes)
            });
        }

        let mut fetched = BTreeMap::new();
        while let Some(joined) = fetches.join_next().await {
            if let Ok((name, bytes)) = joined {
                fetched.insert(name, bytes);
            }
        }
        for name in spawned {
            let bytes = fetched.remove(&name).flatten();
            let resolution = Self::resolution_of(&name, bytes);
            self.table.insert(name, resolution);
        }
    }

    fn resolution_of(class_name: &str, bytes: Option<Vec<u8>>) -> Resolution {
        match bytes {
            None => {
                debug!("no bytes for {class_name}, marking it unresolved");
                Resolution::Unresolved
            }
            Some(bytes) => match class_reader::read_buffer(&bytes) {
                Ok(class_file) => Resolution::Internal(ClassInfo::from_class_file(&class_file)),
                Err(err) => {
                    debug!("cannot parse referenced class {class_name}: {err}");
                    Resolution::Unresolved
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeSet, HashMap, HashSet},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;

    use crate::{
        class_environment::ClassEnvironment,
        class_info::Resolution,
        symbol_resolver::SymbolResolver,
    };

    #[derive(Clone, Default)]
    struct CountingEnvironment {
        classes: Arc<HashMap<String, Vec<u8>>>,
        known: Arc<HashSet<String>>,
        fetches: Arc<AtomicUsize>,
    }

    impl CountingEnvironment {
        fn new(classes: Vec<(&str, Vec<u8>)>, known: Vec<&str>) -> Self {
            Self {
                classes: Arc::new(
                    classes
                        .into_iter()
                        .map(|(name, bytes)| (name.to_string(), bytes))
                        .collect(),
                ),
                known: Arc::new(known.into_iter().map(str::to_string).collect()),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ClassEnvironment for CountingEnvironment {
        async fn fetch(&self, class_name: &str) -> Option<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.classes.get(class_name).cloned()
        }

        fn is_known(&self, class_name: &str) -> bool {
            self.known.contains(class_name)
        }
    }

    fn class_bytes(name: &str, superclass: &str) -> Vec<u8> {
        let mut data = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        data.extend([0x00, 0x05]);
        data.push(1);
        data.extend((name.len() as u16).to_be_bytes());
        data.extend(name.as_bytes());
        data.push(7);
        data.extend((1u16).to_be_bytes());
        data.push(1);
        data.extend((superclass.len() as u16).to_be_bytes());
        data.extend(superclass.as_bytes());
        data.push(7);
        data.extend((3u16).to_be_bytes());
        data.extend([0x00, 0x21]);
        data.extend([0x00, 0x02]);
        data.extend([0x00, 0x04]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data.extend([0x00, 0x00]);
        data
    }

    #[test_log::test(tokio::test)]
    async fn external_names_are_never_fetched() {
        let environment = CountingEnvironment::new(vec![], vec![]);
        let mut resolver = SymbolResolver::new(environment.clone());

        let resolution = resolver.resolve("java/lang/String").await;
        assert_eq!(Resolution::External, resolution);
        assert_eq!(0, environment.fetch_count());
    }

    #[test_log::test(tokio::test)]
    async fn known_but_absent_names_become_unresolved() {
        let environment = CountingEnvironment::new(vec![], vec!["com/missing/Gone"]);
        let mut resolver = SymbolResolver::new(environment.clone());

        let resolution = resolver.resolve("com/missing/Gone").await;
        assert_eq!(Resolution::Unresolved, resolution);
        assert_eq!(1, environment.fetch_count());
    }

    #[test_log::test(tokio::test)]
    async fn outcomes_are_cached() {
        let environment = CountingEnvironment::new(
            vec![("Foo", class_bytes("Foo", "java/lang/Object"))],
            vec!["Foo"],
        );
        let mut resolver = SymbolResolver::new(environment.clone());

        let first = resolver.resolve("Foo").await;
        let second = resolver.resolve("Foo").await;
        assert!(matches!(first, Resolution::Internal(ref info) if info.name == "Foo"));
        assert_eq!(first, second);
        assert_eq!(1, environment.fetch_count());
    }

    #[test_log::test(tokio::test)]
    async fn unparseable_bytes_become_unresolved() {
        let environment =
            CountingEnvironment::new(vec![("Bad", vec![0x00, 0x01, 0x02])], vec!["Bad"]);
        let mut resolver = SymbolResolver::new(environment);

        assert_eq!(Resolution::Unresolved, resolver.resolve("Bad").await);
    }

    #[test_log::test(tokio::test)]
    async fn inheritance_cycles_stay_finite() {
        let environment = CountingEnvironment::new(
            vec![("A", class_bytes("A", "B")), ("B", class_bytes("B", "A"))],
            vec!["A", "B"],
        );
        let mut resolver = SymbolResolver::new(environment.clone());

        let resolution = resolver.resolve_hierarchy("A").await;
        assert!(matches!(resolution, Resolution::Internal(_)));
        assert!(matches!(
            resolver.lookup("B"),
            Some(Resolution::Internal(_))
        ));
        assert_eq!(2, environment.fetch_count());
    }

    #[test_log::test(tokio::test)]
    async fn batches_resolve_each_name_once() {
        let environment = CountingEnvironment::new(
            vec![
                ("A", class_bytes("A", "java/lang/Object")),
                ("B", class_bytes("B", "java/lang/Object")),
            ],
            vec!["A", "B", "C"],
        );
        let mut resolver = SymbolResolver::new(environment.clone());

        let names: BTreeSet<String> = ["A", "B", "C", "java/lang/Object"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        resolver.resolve_batch(&names).await;

        assert!(matches!(
            resolver.lookup("A"),
            Some(Resolution::Internal(_))
        ));
        assert!(matches!(
            resolver.lookup("B"),
            Some(Resolution::Internal(_))
        ));
        assert_eq!(Some(&Resolution::Unresolved), resolver.lookup("C"));
        assert_eq!(Some(&Resolution::External), resolver.lookup("java/lang/Object"));
        assert_eq!(3, environment.fetch_count());
    }
}
