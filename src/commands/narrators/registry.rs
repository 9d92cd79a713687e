use super::*;

pub const NARRATORS_PATH: &str = "/people/narrators";
pub const NARRATOR_INDEX_PATH: &str = "/people/narrators/index";

pub fn narrator_path(id: u32) -> String {
    format!("{NARRATORS_PATH}/{id}")
}

/// Append-only name to id registry plus the narrator records built during a run.
#[derive(Debug, Default)]
pub struct NarratorRegistry {
    name_id: BTreeMap<String, u32>,
    id_name: BTreeMap<u32, String>,
    last_id: u32,
    narrators: BTreeMap<u32, Narrator>,
}

impl NarratorRegistry {
    /// Loads the persisted index and narrator records; a missing index yields an
    /// empty registry.
    pub fn seed(store: &dyn RecordStore) -> Result<Self> {
        let record = match store.read(NARRATOR_INDEX_PATH) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                info!("no narrator index stored, starting from an empty registry");
                return Ok(Self::default());
            }
            Err(err) => return Err(err).context("failed to read narrator index"),
        };

        let id_name: BTreeMap<u32, String> =
            serde_json::from_value(record.data).context("failed to decode narrator index")?;

        let mut registry = Self::default();
        for (id, name) in id_name {
            registry.insert_name(id, name);
        }

        let ids: Vec<u32> = registry.id_name.keys().copied().collect();
        for id in ids {
            let path = narrator_path(id);
            match store.read(&path) {
                Ok(record) => {
                    let narrator: Narrator = serde_json::from_value(record.data)
                        .with_context(|| format!("failed to decode narrator {path}"))?;
                    registry.narrators.insert(id, narrator);
                }
                Err(StoreError::NotFound(_)) => {}
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to read narrator {path}"));
                }
            }
        }

        info!(
            names = registry.id_name.len(),
            records = registry.narrators.len(),
            "seeded narrator registry"
        );
        Ok(registry)
    }

    fn insert_name(&mut self, id: u32, name: String) {
        self.last_id = self.last_id.max(id);
        self.name_id.insert(name.clone(), id);
        self.id_name.insert(id, name);
    }

    pub fn len(&self) -> usize {
        self.id_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_name.is_empty()
    }

    /// Id of `name`, assigning the next free id on first sight.
    pub fn assign(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_id.get(name) {
            return id;
        }
        let id = self.last_id + 1;
        self.insert_name(id, name.to_string());
        id
    }

    #[cfg(test)]
    pub fn name(&self, id: u32) -> Option<&str> {
        self.id_name.get(&id).map(String::as_str)
    }

    #[cfg(test)]
    pub fn narrator(&self, id: u32) -> Option<&Narrator> {
        self.narrators.get(&id)
    }

    /// Records `unit_path` against each narrator of the chain and against every
    /// contiguous sub-chain the narrator takes part in.
    pub fn record_unit(&mut self, unit_path: &str, ids: &[u32]) {
        let runs = contiguous_subchains(ids);

        for &id in ids {
            let name = self.id_name.get(&id).cloned().unwrap_or_default();
            let narrator = self.narrators.entry(id).or_insert_with(|| Narrator {
                titles: BTreeMap::from([(Language::Ar.as_str().to_string(), name)]),
                index: id,
                path: narrator_path(id),
                verse_count: 0,
                verse_paths: BTreeSet::new(),
                subchains: BTreeMap::new(),
            });
            narrator.verse_paths.insert(unit_path.to_string());

            for (key, run) in runs.iter().filter(|(_, run)| run.contains(&id)) {
                narrator
                    .subchains
                    .entry(key.clone())
                    .or_insert_with(|| ChainVerses {
                        narrator_ids: run.clone(),
                        verse_paths: BTreeSet::new(),
                    })
                    .verse_paths
                    .insert(unit_path.to_string());
            }
        }
    }

    /// Writes every narrator record and the index; returns the number of narrators written.
    pub fn persist(&mut self, store: &dyn RecordStore) -> Result<usize> {
        for narrator in self.narrators.values_mut() {
            narrator.verse_count = narrator.verse_paths.len();
            let data = serde_json::to_value(&*narrator)
                .with_context(|| format!("failed to encode narrator {}", narrator.path))?;
            store.write(
                &narrator.path,
                &Record {
                    index: NodeIndex::Ordinal(u64::from(narrator.index)),
                    kind: RecordKind::PersonContent,
                    data,
                },
            )?;
        }

        let data = serde_json::to_value(&self.id_name).context("failed to encode narrator index")?;
        store.write(
            NARRATOR_INDEX_PATH,
            &Record {
                index: NodeIndex::Key("people".to_string()),
                kind: RecordKind::PersonList,
                data,
            },
        )?;

        debug!(narrators = self.narrators.len(), "persisted narrator registry");
        Ok(self.narrators.len())
    }
}
