use hematite::buffer::lru_replacer::LruReplacer;

#[test]
fn test_sample() {
    let lru_replacer = LruReplacer::new(7);

    // Scenario: unpin six elements, i.e. add them to the replacer.
    lru_replacer.unpin(1);
    lru_replacer.unpin(2);
    lru_replacer.unpin(3);
    lru_replacer.unpin(4);
    lru_replacer.unpin(5);
    lru_replacer.unpin(6);
    lru_replacer.unpin(1);
    assert_eq!(lru_replacer.size(), 6);

    // Scenario: get three victims from the lru.
    assert_eq!(lru_replacer.victim(), Some(1));
    assert_eq!(lru_replacer.victim(), Some(2));
    assert_eq!(lru_replacer.victim(), Some(3));

    // Scenario: pin elements in the replacer. Note that 3 has already been
    // victimized, so pinning 3 should have no effect.
    lru_replacer.pin(3);
    lru_replacer.pin(4);
    assert_eq!(lru_replacer.size(), 2);

    // Scenario: unpin 4. We expect that the reference bit of 4 will be set
    // to 1.
    lru_replacer.unpin(4);

    // Scenario: continue looking for victims. We expect these victims.
    assert_eq!(lru_replacer.victim(), Some(5));
    assert_eq!(lru_replacer.victim(), Some(6));
    assert_eq!(lru_replacer.victim(), Some(4));
    assert_eq!(lru_replacer.victim(), None);
}

#[test]
fn test_victim_order_is_least_recently_available() {
    let lru_replacer = LruReplacer::new(4);
    lru_replacer.unpin(0);
    lru_replacer.unpin(1);
    lru_replacer.unpin(2);

    // re-adding an existing frame does not refresh its position
    lru_replacer.unpin(0);
    assert_eq!(lru_replacer.victim(), Some(0));

    // pin-then-unpin does refresh it
    lru_replacer.unpin(3);
    lru_replacer.pin(1);
    lru_replacer.unpin(1);
    assert_eq!(lru_replacer.victim(), Some(2));
    assert_eq!(lru_replacer.victim(), Some(3));
    assert_eq!(lru_replacer.victim(), Some(1));
}

#[test]
fn test_empty_replacer() {
    let lru_replacer = LruReplacer::new(3);
    assert_eq!(lru_replacer.size(), 0);
    assert_eq!(lru_replacer.victim(), None);
    lru_replacer.pin(2);
    assert_eq!(lru_replacer.victim(), None);
}

#[test]
fn test_concurrent_unpin_and_victim() {
    use std::sync::Arc;
    use std::thread;

    let lru_replacer = Arc::new(LruReplacer::new(1000));
    let mut handles = vec![];
    for t in 0..4 {
        let replacer = Arc::clone(&lru_replacer);
        handles.push(thread::spawn(move || {
            for i in 0..250 {
                replacer.unpin(t * 250 + i);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(lru_replacer.size(), 1000);

    let mut victims = vec![];
    while let Some(frame) = lru_replacer.victim() {
        victims.push(frame);
    }
    victims.sort_unstable();
    assert_eq!(victims, (0..1000).collect::<Vec<_>>());
}
