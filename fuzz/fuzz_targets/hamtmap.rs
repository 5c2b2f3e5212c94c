#![no_main]

use std::collections::HashMap as NatMap;
use std::iter::FromIterator;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use phamt::HamtMap;

#[derive(Arbitrary, Debug)]
enum Action<K, V> {
    Assoc(K, V),
    Without(K),
    Find(K),
    // Go back to an earlier version of the map.
    Rewind(u8),
}

fuzz_target!(|actions: Vec<Action<u16, u32>>| {
    let mut map = HamtMap::new();
    let mut nat = NatMap::new();
    let mut history = vec![(map.clone(), nat.clone())];
    for action in actions {
        match action {
            Action::Assoc(key, value) => {
                nat.insert(key, value);
                map = map.assoc(key, value).unwrap();
            }
            Action::Without(key) => {
                nat.remove(&key);
                map = map.without(&key).unwrap();
            }
            Action::Find(key) => {
                assert_eq!(nat.get(&key), map.find(&key).unwrap());
            }
            Action::Rewind(back) => {
                let index = history.len() - 1 - (back as usize % history.len());
                let (old_map, old_nat) = history[index].clone();
                map = old_map;
                nat = old_nat;
            }
        }
        assert_eq!(nat.len(), map.len());
        history.push((map.clone(), nat.clone()));
    }
    for (map, nat) in history {
        assert_eq!(map.len(), map.iter().count());
        assert_eq!(HamtMap::from_iter(nat.clone()), map);
        assert_eq!(NatMap::from_iter(map.iter().map(|(k, v)| (*k, *v))), nat);
    }
});
