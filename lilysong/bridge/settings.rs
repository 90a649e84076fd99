use std::sync::{Arc, Mutex};

type ThemeObserver = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Observable store for page settings the host cares about.
///
/// Observers fire on every write, including writes of an unchanged value,
/// because the page reports intent rather than diffs.
#[derive(Clone, Default)]
pub struct SettingsStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    theme: Option<String>,
    observers: Vec<ThemeObserver>,
}

impl SettingsStore {
    pub fn new() -> Self {
        SettingsStore::default()
    }

    pub fn subscribe(&self, observer: impl Fn(&str) + Send + Sync + 'static) {
        self.inner.lock().unwrap().observers.push(Arc::new(observer));
    }

    /// Observers run outside the lock so they may read the store back.
    pub fn set_theme(&self, name: &str) {
        let observers: Vec<ThemeObserver> = {
            let mut inner = self.inner.lock().unwrap();
            inner.theme = Some(name.to_string());
            inner.observers.clone()
        };
        for observer in &observers {
            observer(name);
        }
    }

    pub fn theme(&self) -> Option<String> {
        self.inner.lock().unwrap().theme.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observers_fire_on_every_write() {
        let store = SettingsStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |name| sink.lock().unwrap().push(name.to_string()));

        store.set_theme("black");
        store.set_theme("black");
        store.set_theme("white");

        assert_eq!(*seen.lock().unwrap(), vec!["black", "black", "white"]);
        assert_eq!(store.theme().as_deref(), Some("white"));
    }

    #[test]
    fn every_observer_sees_the_write() {
        let store = SettingsStore::new();
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let a = first.clone();
        let b = second.clone();
        store.subscribe(move |_| *a.lock().unwrap() += 1);
        store.subscribe(move |_| *b.lock().unwrap() += 1);

        store.set_theme("black");

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn theme_starts_unset() {
        assert!(SettingsStore::new().theme().is_none());
    }

    #[test]
    fn an_observer_may_read_the_store_back() {
        let store = SettingsStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reader = store.clone();
        store.subscribe(move |_| {
            sink.lock().unwrap().push(reader.theme());
        });

        store.set_theme("black");

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("black".to_string())]
        );
    }
}
