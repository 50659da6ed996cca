//! Live settings store.
//!
//! # Responsibilities
//! - Hold the startup settings plus the current set of live overrides
//! - Accept new override snapshots, rejecting what is not allowed
//! - Notify registered consumers when a value actually changes
//!
//! # Update rules
//! - Unknown keys are ignored
//! - Keys without the `Dynamic` property cannot be changed
//! - Malformed values are rejected and the last known-good value is kept
//! - A key dropped from the snapshot reverts to its startup value
//!
//! Snapshots are swapped atomically; readers never block.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::setting::{BoolSetting, SettingDescriptor, Settings};
use crate::error::SettingsError;
use crate::observability::metrics;

type Consumer = Arc<dyn Fn(bool) + Send + Sync>;

/// Outcome of a single `apply` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Keys whose effective value changed.
    pub changed: Vec<String>,
    /// Rejected entries of the snapshot.
    pub rejected: Vec<SettingsError>,
}

/// Settings store with change notification.
pub struct LiveSettings {
    base: Settings,
    overrides: ArcSwap<Settings>,
    registered: DashMap<&'static str, SettingDescriptor>,
    consumers: DashMap<&'static str, Vec<(BoolSetting, Consumer)>>,
    apply_lock: Mutex<()>,
}

impl std::fmt::Debug for LiveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSettings")
            .field("base", &self.base)
            .field("overrides", &self.overrides.load())
            .field("registered", &self.registered.len())
            .finish_non_exhaustive()
    }
}

impl LiveSettings {
    /// Create a store seeded with the node's startup settings.
    pub fn new(base: Settings) -> Self {
        Self {
            base,
            overrides: ArcSwap::from_pointee(Settings::new()),
            registered: DashMap::new(),
            consumers: DashMap::new(),
            apply_lock: Mutex::new(()),
        }
    }

    /// Declare a known setting.
    pub fn register(&self, descriptor: SettingDescriptor) {
        tracing::debug!(
            key = descriptor.key,
            dynamic = descriptor.is_dynamic(),
            "Registered setting"
        );
        self.registered.insert(descriptor.key, descriptor);
    }

    /// All registered descriptors, ordered by key.
    pub fn registered(&self) -> Vec<SettingDescriptor> {
        let mut descriptors: Vec<_> = self
            .registered
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        descriptors.sort_by_key(|d| d.key);
        descriptors
    }

    /// Current effective value of a boolean setting.
    pub fn get_bool(&self, setting: &BoolSetting) -> bool {
        self.resolve(setting, &self.overrides.load())
    }

    /// Register a consumer called with the new value whenever `setting` changes.
    ///
    /// The setting must be registered and dynamic. Consumers run on the
    /// thread that applies the update and must not block.
    pub fn add_update_consumer<F>(&self, setting: BoolSetting, consumer: F) -> Result<(), SettingsError>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let _guard = self.lock_updates();
        self.push_consumer(setting, Arc::new(consumer))
    }

    /// Like [`add_update_consumer`](Self::add_update_consumer), but also hands
    /// the consumer the current value before returning.
    ///
    /// No update can be applied between subscribing and the initial call, so
    /// the consumer never sees a stale value last.
    pub fn add_update_consumer_with_current<F>(
        &self,
        setting: BoolSetting,
        consumer: F,
    ) -> Result<(), SettingsError>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let _guard = self.lock_updates();
        let consumer: Consumer = Arc::new(consumer);
        self.push_consumer(setting, Arc::clone(&consumer))?;
        consumer(self.get_bool(&setting));
        Ok(())
    }

    fn push_consumer(&self, setting: BoolSetting, consumer: Consumer) -> Result<(), SettingsError> {
        let descriptor = self
            .registered
            .get(setting.key())
            .ok_or_else(|| SettingsError::Unknown {
                key: setting.key().to_string(),
            })?;
        if !descriptor.is_dynamic() {
            return Err(SettingsError::NotDynamic {
                key: setting.key().to_string(),
            });
        }
        drop(descriptor);

        self.consumers
            .entry(setting.key())
            .or_default()
            .push((setting, consumer));
        Ok(())
    }

    fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.apply_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the live overrides with `update`.
    pub fn apply(&self, update: Settings) -> ApplyReport {
        let _guard = self.lock_updates();

        let previous = self.overrides.load_full();
        let mut next = Settings::new();
        let mut report = ApplyReport::default();

        for (key, value) in update.iter() {
            match self.check_update(key, value) {
                Ok(()) => next.insert(key, value),
                Err(error) => {
                    tracing::warn!(%error, "Rejected settings update, keeping last known-good value");
                    metrics::record_settings_update(key, "rejected");
                    if let Some(last_good) = previous.get(key) {
                        next.insert(key, last_good);
                    }
                    report.rejected.push(error);
                }
            }
        }

        let keys: BTreeSet<&str> = previous.keys().chain(next.keys()).collect();
        for key in keys {
            if previous.get(key) != next.get(key) {
                report.changed.push(key.to_string());
            }
        }

        let next = Arc::new(next);
        self.overrides.store(Arc::clone(&next));

        for key in &report.changed {
            metrics::record_settings_update(key, "applied");
            tracing::info!(key = %key, value = ?self.effective(key, &next), "Updated setting");
        }
        self.notify(&report.changed, &previous, &next);
        report
    }

    fn check_update(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let descriptor = self.registered.get(key).ok_or_else(|| SettingsError::Unknown {
            key: key.to_string(),
        })?;
        if !descriptor.is_dynamic() {
            return Err(SettingsError::NotDynamic {
                key: key.to_string(),
            });
        }
        descriptor.validate(value)
    }

    fn notify(&self, changed: &[String], previous: &Settings, next: &Settings) {
        for key in changed {
            let Some(consumers) = self.consumers.get(key.as_str()) else {
                continue;
            };
            for (setting, consumer) in consumers.iter() {
                let old = self.resolve(setting, previous);
                let new = self.resolve(setting, next);
                if old != new {
                    consumer(new);
                }
            }
        }
    }

    fn effective<'a>(&'a self, key: &str, overrides: &'a Settings) -> Option<&'a str> {
        overrides.get(key).or_else(|| self.base.get(key))
    }

    fn resolve(&self, setting: &BoolSetting, overrides: &Settings) -> bool {
        match self.effective(setting.key(), overrides) {
            Some(raw) => crate::config::setting::parse_bool(setting.key(), raw)
                .unwrap_or(setting.default_value()),
            None => setting.default_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::setting::Property;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DYNAMIC: BoolSetting = BoolSetting::new(
        "test.dynamic",
        false,
        &[Property::NodeScope, Property::Dynamic],
        "dynamic test flag",
    );

    const STATIC: BoolSetting =
        BoolSetting::new("test.static", true, &[Property::NodeScope], "static test flag");

    fn store(base: Settings) -> LiveSettings {
        let live = LiveSettings::new(base);
        live.register(DYNAMIC.descriptor());
        live.register(STATIC.descriptor());
        live
    }

    #[test]
    fn test_consumer_sees_changes() {
        let live = store(Settings::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        live.add_update_consumer(DYNAMIC, move |value| sink.lock().unwrap().push(value))
            .unwrap();

        live.apply(Settings::new().with("test.dynamic", "true"));
        live.apply(Settings::new().with("test.dynamic", "true"));
        live.apply(Settings::new().with("test.dynamic", "false"));

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_malformed_value_keeps_last_known_good() {
        let live = store(Settings::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        live.add_update_consumer(DYNAMIC, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        live.apply(Settings::new().with("test.dynamic", "true"));
        let report = live.apply(Settings::new().with("test.dynamic", "yes please"));

        assert!(live.get_bool(&DYNAMIC));
        assert!(report.changed.is_empty());
        assert_eq!(
            report.rejected,
            vec![SettingsError::Malformed {
                key: "test.dynamic".into(),
                value: "yes please".into(),
            }]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_static_setting_cannot_change() {
        let live = store(Settings::new());
        let report = live.apply(Settings::new().with("test.static", "false"));

        assert!(live.get_bool(&STATIC));
        assert_eq!(
            report.rejected,
            vec![SettingsError::NotDynamic {
                key: "test.static".into()
            }]
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let live = store(Settings::new());
        let report = live.apply(Settings::new().with("no.such.key", "1"));
        assert!(report.changed.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn test_dropped_override_reverts_to_startup_value() {
        let live = store(Settings::new().with("test.dynamic", "true"));
        assert!(live.get_bool(&DYNAMIC));

        live.apply(Settings::new().with("test.dynamic", "false"));
        assert!(!live.get_bool(&DYNAMIC));

        let report = live.apply(Settings::new());
        assert_eq!(report.changed, vec!["test.dynamic".to_string()]);
        assert!(live.get_bool(&DYNAMIC));
    }

    #[test]
    fn test_consumer_with_current_sees_value_then_changes() {
        let live = store(Settings::new().with("test.dynamic", "true"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        live.add_update_consumer_with_current(DYNAMIC, move |value| sink.lock().unwrap().push(value))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![true]);

        live.apply(Settings::new().with("test.dynamic", "false"));
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_consumer_with_current_does_not_race_apply() {
        let live = Arc::new(store(Settings::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let writer = {
            let live = Arc::clone(&live);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let value = if i % 2 == 0 { "true" } else { "false" };
                    live.apply(Settings::new().with("test.dynamic", value));
                }
                live.apply(Settings::new().with("test.dynamic", "false"));
            })
        };

        let sink = Arc::clone(&seen);
        live.add_update_consumer_with_current(DYNAMIC, move |value| sink.lock().unwrap().push(value))
            .unwrap();
        writer.join().unwrap();

        // Whatever interleaving happened, the last value observed is the store's.
        assert_eq!(seen.lock().unwrap().last().copied(), Some(live.get_bool(&DYNAMIC)));
        assert!(!live.get_bool(&DYNAMIC));
    }

    #[test]
    fn test_consumer_requires_dynamic_setting() {
        let live = store(Settings::new());
        assert!(matches!(
            live.add_update_consumer(STATIC, |_| {}),
            Err(SettingsError::NotDynamic { .. })
        ));

        let unregistered = LiveSettings::new(Settings::new());
        assert!(matches!(
            unregistered.add_update_consumer(DYNAMIC, |_| {}),
            Err(SettingsError::Unknown { .. })
        ));
        assert!(matches!(
            unregistered.add_update_consumer_with_current(DYNAMIC, |_| {}),
            Err(SettingsError::Unknown { .. })
        ));
    }
}
