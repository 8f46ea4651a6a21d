use hematite::buffer::BufferPool;
use hematite::storage::index::int_comparator::IntComparator;
use hematite::storage::page::hash_table_bucket_page::{
    HashTableBucketPage, HashTableBucketPageMut,
};
use hematite::storage::page::hash_table_directory_page::{
    HashTableDirectoryPage, HashTableDirectoryPageMut,
};

use crate::common::TestContext;

#[test]
fn test_bucket_page_sample() {
    let ctx = TestContext::new(5);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    let cmp = IntComparator::new();
    {
        let mut data = page.data().write();
        let mut bucket = HashTableBucketPageMut::<i32, i32>::view(&mut data[..]);

        // insert a few (key, value) pairs
        for i in 0..10 {
            assert!(bucket.insert(&i, &(i * 2), &cmp));
        }

        // check for the inserted pairs
        let view = bucket.as_read();
        for i in 0..10 {
            let mut res = vec![];
            assert!(view.get_value(&i, &cmp, &mut res));
            assert_eq!(res, vec![i * 2]);
        }

        // duplicate pairs are rejected, same key with new value is not
        for i in 0..10 {
            assert!(!bucket.insert(&i, &(i * 2), &cmp));
            assert!(bucket.insert(&i, &(i * 2 + 1), &cmp));
        }

        // remove the original pairs
        for i in 0..10 {
            assert!(bucket.remove(&i, &(i * 2), &cmp));
            // removing them again fails
            assert!(!bucket.remove(&i, &(i * 2), &cmp));
        }
        for i in 0..10 {
            let mut res = vec![];
            assert!(bucket.as_read().get_value(&i, &cmp, &mut res));
            assert_eq!(res, vec![i * 2 + 1]);
        }
    }
    page.set_dirty(true);
    assert!(bpm.unpin_page(page.get_page_id(), true));
}

#[test]
fn test_bucket_page_occupancy_counters() {
    let ctx = TestContext::new(5);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    let cmp = IntComparator::new();
    {
        let mut data = page.data().write();
        let mut bucket = HashTableBucketPageMut::<i32, i32>::view(&mut data[..]);

        assert!(bucket.is_empty());
        assert_eq!(bucket.num_readable(), 0);

        for i in 0..50 {
            assert!(bucket.insert(&i, &i, &cmp));
        }
        assert_eq!(bucket.num_readable(), 50);
        assert!(!bucket.is_empty());
        assert!(!bucket.is_full());

        for i in 0..50 {
            assert!(bucket.remove(&i, &i, &cmp));
        }
        assert!(bucket.is_empty());
        // tombstones keep the slots occupied
        let view = bucket.as_read();
        assert!(view.is_occupied(49));
        assert!(!view.is_readable(49));
    }
    assert!(bpm.unpin_page(page.get_page_id(), true));
}

#[test]
fn test_directory_page_sample() {
    let ctx = TestContext::new(5);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    {
        let mut data = page.data().write();
        let mut dir = HashTableDirectoryPageMut::view(&mut data[..]);
        dir.init(page.get_page_id());
        dir.set_lsn(3);

        let view = dir.as_read();
        assert_eq!(view.get_page_id(), page.get_page_id());
        assert_eq!(view.get_lsn(), 3);
        assert_eq!(view.get_global_depth(), 0);
        assert_eq!(view.size(), 1);

        // grow to depth 2 with buckets 10..14 and uniform local depth 2
        dir.set_bucket_page_id(0, 10);
        dir.incr_global_depth();
        dir.set_bucket_page_id(1, 11);
        dir.set_local_depth(0, 1);
        dir.set_local_depth(1, 1);
        dir.incr_global_depth();
        for i in 0..4 {
            dir.set_bucket_page_id(i, 10 + i);
            dir.set_local_depth(i, 2);
        }

        let view = dir.as_read();
        assert_eq!(view.get_global_depth(), 2);
        assert_eq!(view.get_global_depth_mask(), 0x3);
        assert_eq!(view.size(), 4);
        for i in 0..4 {
            assert_eq!(view.get_bucket_page_id(i), 10 + i);
            assert_eq!(view.get_local_depth_mask(i), 0x3);
            // with local depth == global depth the split image flips the top
            // in-use bit
            assert_eq!(view.get_split_image_index(i), i ^ 0x2);
        }
        view.verify_integrity();
        assert!(!view.can_shrink());

        // collapse one pair back to depth 1
        dir.set_bucket_page_id(2, 10);
        dir.set_local_depth(0, 1);
        dir.set_local_depth(2, 1);
        dir.as_read().verify_integrity();
    }
    assert!(bpm.unpin_page(page.get_page_id(), true));
}

#[test]
fn test_directory_shrink_round_trip() {
    let ctx = TestContext::new(5);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    {
        let mut data = page.data().write();
        let mut dir = HashTableDirectoryPageMut::view(&mut data[..]);
        dir.init(page.get_page_id());
        dir.set_bucket_page_id(0, 42);

        dir.incr_global_depth();
        assert_eq!(dir.as_read().size(), 2);
        // both halves still share bucket 42 at depth 0, so we can shrink
        assert!(dir.as_read().can_shrink());
        dir.decr_global_depth();
        assert_eq!(dir.as_read().size(), 1);
        assert!(!dir.as_read().can_shrink());
        dir.as_read().verify_integrity();
    }
    assert!(bpm.unpin_page(page.get_page_id(), true));
}

#[test]
fn test_directory_layout_persists_through_pool() {
    let ctx = TestContext::new(2);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    let dir_pid = page.get_page_id();
    {
        let mut data = page.data().write();
        let mut dir = HashTableDirectoryPageMut::view(&mut data[..]);
        dir.init(dir_pid);
        dir.set_bucket_page_id(0, 77);
        dir.incr_global_depth();
    }
    assert!(bpm.unpin_page(dir_pid, true));

    // churn the pool so the directory page gets evicted and re-read
    for _ in 0..4 {
        let page = bpm.new_page().unwrap();
        let pid = page.get_page_id();
        assert!(bpm.unpin_page(pid, false));
    }

    let page = bpm.fetch_page(dir_pid).unwrap();
    {
        let data = page.data().read();
        let dir = HashTableDirectoryPage::view(&data[..]);
        assert_eq!(dir.get_page_id(), dir_pid);
        assert_eq!(dir.get_global_depth(), 1);
        assert_eq!(dir.get_bucket_page_id(0), 77);
        assert_eq!(dir.get_bucket_page_id(1), 77);
    }
    assert!(bpm.unpin_page(dir_pid, false));
}

#[test]
fn test_bucket_page_generic_keys() {
    use hematite::common::rid::Rid;
    use hematite::storage::index::generic_key::{GenericComparator, GenericKey};

    let ctx = TestContext::new(5);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    let cmp = GenericComparator::<8>::new();
    {
        let mut data = page.data().write();
        let mut bucket =
            HashTableBucketPageMut::<GenericKey<8>, Rid>::view(&mut data[..]);

        for i in 0..20 {
            let mut key = GenericKey::<8>::new();
            key.set_from_integer(i);
            let rid = Rid::new(i as u32, i as u32);
            assert!(bucket.insert(&key, &rid, &cmp));
        }

        let view = bucket.as_read();
        assert_eq!(view.num_readable(), 20);
        let mut key = GenericKey::<8>::new();
        key.set_from_integer(7);
        let mut res = vec![];
        assert!(view.get_value(&key, &cmp, &mut res));
        assert_eq!(res, vec![Rid::new(7, 7)]);
    }
    assert!(bpm.unpin_page(page.get_page_id(), true));

    // capacity for the (GenericKey<8>, Rid) instantiation
    assert_eq!(
        HashTableBucketPage::<GenericKey<8>, Rid>::capacity(),
        4 * 4096 / (4 * 16 + 1)
    );
}
