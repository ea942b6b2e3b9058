//! Engine-level tests exercising [`Store`] through the [`KvEngine`] trait.

use std::collections::HashMap;

use bytekv::{KvEngine, Store};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

#[test]
fn set_then_get_round_trips_exact_bytes() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    store.set(b"foo", b"bar").unwrap();
    let value = store.get(b"foo").unwrap().unwrap();
    assert_eq!(value.as_bytes(), b"bar");
    assert_eq!(value.len(), 3);
}

#[test]
fn get_of_absent_key_is_none() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    assert!(store.get(b"missing").unwrap().is_none());
}

#[test]
fn overwrite_replaces_the_value() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    store.set(b"k", b"v1").unwrap();
    store.set(b"k", b"v2").unwrap();
    assert_eq!(store.get(b"k").unwrap().unwrap().as_bytes(), b"v2");
}

#[test]
fn delete_then_second_delete_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    store.set(b"k", b"v").unwrap();
    assert!(store.del(b"k").unwrap());
    assert!(store.get(b"k").unwrap().is_none());
    assert!(!store.del(b"k").unwrap());
}

#[test]
fn rename_preserves_value_and_frees_old_key() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    store.set(b"k1", b"v").unwrap();
    assert!(store.rename(b"k1", b"k2").unwrap());
    assert!(store.get(b"k1").unwrap().is_none());
    assert_eq!(store.get(b"k2").unwrap().unwrap().as_bytes(), b"v");
}

#[test]
fn rename_of_absent_key_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    assert!(!store.rename(b"a", b"b").unwrap());
    assert!(store.get(b"b").unwrap().is_none());
}

#[test]
fn rename_overwrites_existing_target() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();
    assert!(store.rename(b"a", b"b").unwrap());
    assert_eq!(store.get(b"b").unwrap().unwrap().as_bytes(), b"1");
    assert!(store.get(b"a").unwrap().is_none());
}

#[test]
fn exists_reflects_presence() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    assert!(!store.exists(b"k").unwrap());
    store.set(b"k", b"v").unwrap();
    assert!(store.exists(b"k").unwrap());
    store.del(b"k").unwrap();
    assert!(!store.exists(b"k").unwrap());
}

#[test]
fn binary_keys_and_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    let key: &[u8] = &[0x00, b'k', 0xff, b' ', 0x07];
    let value: &[u8] = &[0x00, 0x00, 0xfe, b'\t'];
    store.set(key, value).unwrap();
    assert_eq!(store.get(key).unwrap().unwrap().as_bytes(), value);
    assert!(store.exists(key).unwrap());
    // the printable prefix of the key is a different key
    assert!(store.get(b"k").unwrap().is_none());
}

#[test]
fn concurrent_sets_to_distinct_keys_all_land() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    const WRITERS: u8 = 8;
    const KEYS_PER_WRITER: u8 = 50;

    crossbeam_utils::thread::scope(|s| {
        for w in 0..WRITERS {
            let store = store.clone();
            s.spawn(move |_| {
                for i in 0..KEYS_PER_WRITER {
                    store.set(&[w, i], &[w, i, w, i]).unwrap();
                }
            });
        }
    })
    .unwrap();

    for w in 0..WRITERS {
        for i in 0..KEYS_PER_WRITER {
            assert_eq!(
                store.get(&[w, i]).unwrap().unwrap().as_bytes(),
                &[w, i, w, i]
            );
        }
    }
}

#[test]
fn concurrent_readers_never_observe_a_torn_value() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();

    let a = vec![0xaa_u8; 512];
    let b = vec![0xbb_u8; 512];
    store.set(b"k", &a).unwrap();

    crossbeam_utils::thread::scope(|s| {
        {
            let store = store.clone();
            let (a, b) = (a.clone(), b.clone());
            s.spawn(move |_| {
                for i in 0..200 {
                    let value = if i % 2 == 0 { &b } else { &a };
                    store.set(b"k", value).unwrap();
                }
            });
        }
        for _ in 0..4 {
            let store = store.clone();
            let (a, b) = (a.clone(), b.clone());
            s.spawn(move |_| {
                for _ in 0..200 {
                    let value = store.get(b"k").unwrap().unwrap();
                    let bytes = value.as_bytes();
                    assert!(
                        bytes == a.as_slice() || bytes == b.as_slice(),
                        "torn value observed"
                    );
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn reopening_replays_the_log() {
    let dir = TempDir::new().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        store.set(b"kept", b"v1").unwrap();
        store.set(b"kept", b"v2").unwrap();
        store.set(b"deleted", b"gone").unwrap();
        store.set(b"moved", b"payload").unwrap();
        store.del(b"deleted").unwrap();
        store.rename(b"moved", b"target").unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.get(b"kept").unwrap().unwrap().as_bytes(), b"v2");
    assert!(store.get(b"deleted").unwrap().is_none());
    assert!(store.get(b"moved").unwrap().is_none());
    assert_eq!(store.get(b"target").unwrap().unwrap().as_bytes(), b"payload");
}

#[test]
fn oversized_set_is_refused_and_later_writes_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let store = Store::open(dir.path()).unwrap();
        store.set(b"small", b"v").unwrap();

        let big = vec![0x61_u8; 17 * 1024 * 1024];
        assert!(store.set(b"big", &big).is_err());
        assert!(!store.exists(b"big").unwrap());

        store.set(b"after", b"w").unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.get(b"small").unwrap().unwrap().as_bytes(), b"v");
    assert_eq!(store.get(b"after").unwrap().unwrap().as_bytes(), b"w");
    assert!(store.get(b"big").unwrap().is_none());
}

#[test]
fn randomized_operations_match_a_model() {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let mut model: HashMap<Vec<u8>, Vec<u8>> = HashMap::new();
    let mut rng = SmallRng::seed_from_u64(7);

    for _ in 0..500 {
        let key = vec![rng.gen_range(0..20_u8)];
        match rng.gen_range(0..4_u8) {
            0 | 1 => {
                let len = rng.gen_range(0..16_usize);
                let value: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                store.set(&key, &value).unwrap();
                model.insert(key, value);
            }
            2 => {
                let deleted = store.del(&key).unwrap();
                assert_eq!(deleted, model.remove(&key).is_some());
            }
            _ => {
                let got = store.get(&key).unwrap().map(|v| v.into_vec());
                assert_eq!(got, model.get(&key).cloned());
            }
        }
    }

    for (key, value) in &model {
        assert_eq!(store.get(key).unwrap().unwrap().as_bytes(), &value[..]);
    }
}
