use hematite::buffer::BufferPool;
use hematite::common::config::DB_PAGE_SIZE;
use hematite::common::exception::BufferPoolError;

use crate::common::{ParallelTestContext, TestContext};

#[test]
fn test_binary_data_round_trip() {
    let ctx = TestContext::new(10);
    let bpm = &ctx.bpm;

    let page0 = bpm.new_page().unwrap();
    assert_eq!(page0.get_page_id(), 0);

    // fill the page with pseudo-random bytes, including interior zeroes
    let mut random_data = [0u8; DB_PAGE_SIZE];
    for (i, byte) in random_data.iter_mut().enumerate() {
        *byte = (i * 31 + 7) as u8;
    }
    random_data[DB_PAGE_SIZE / 2] = 0;
    random_data[DB_PAGE_SIZE - 1] = 0;
    page0.data().write().copy_from_slice(&random_data);

    // fill up the pool, then exhaust it
    for _ in 1..10 {
        bpm.new_page().unwrap();
    }
    for _ in 10..15 {
        assert!(matches!(bpm.new_page(), Err(BufferPoolError::NoFreeFrame)));
    }

    // unpin and push page 0 out of the pool
    assert!(bpm.unpin_page(0, true));
    for _ in 0..5 {
        let page = bpm.new_page().unwrap();
        let pid = page.get_page_id();
        assert!(bpm.unpin_page(pid, false));
    }

    // page 0's bytes must come back from disk intact
    let page0 = bpm.fetch_page(0).unwrap();
    assert_eq!(&page0.data().read()[..], &random_data[..]);
    assert!(bpm.unpin_page(0, false));
}

#[test]
fn test_fetch_pinned_page_hits_cache() {
    let ctx = TestContext::new(3);
    let bpm = &ctx.bpm;

    let page = bpm.new_page().unwrap();
    let pid = page.get_page_id();
    page.data().write()[0] = 0x5A;

    let again = bpm.fetch_page(pid).unwrap();
    assert_eq!(again.data().read()[0], 0x5A);
    assert_eq!(again.get_pin_count(), 2);

    assert!(bpm.unpin_page(pid, true));
    assert!(bpm.unpin_page(pid, false));
    // dirty flag from the first unpin is sticky
    assert!(again.is_dirty());
}

#[test]
fn test_pinned_pages_are_never_evicted() {
    let ctx = TestContext::new(2);
    let bpm = &ctx.bpm;

    let p0 = bpm.new_page().unwrap();
    let p1 = bpm.new_page().unwrap();
    assert!(matches!(bpm.new_page(), Err(BufferPoolError::NoFreeFrame)));
    assert!(matches!(
        bpm.fetch_page(99),
        Err(BufferPoolError::NoFreeFrame)
    ));

    assert!(bpm.unpin_page(p0.get_page_id(), false));
    let p2 = bpm.new_page().unwrap();
    assert_eq!(p2.get_page_id(), 2);
    assert_eq!(p1.get_pin_count(), 1);
}

#[test]
fn test_delete_and_reuse_frame() {
    let ctx = TestContext::new(2);
    let bpm = &ctx.bpm;

    let p0 = bpm.new_page().unwrap();
    let _p1 = bpm.new_page().unwrap();

    assert!(!bpm.delete_page(p0.get_page_id()));
    assert!(bpm.unpin_page(p0.get_page_id(), false));
    assert!(bpm.delete_page(p0.get_page_id()));

    // the freed frame is immediately usable again
    let p2 = bpm.new_page().unwrap();
    assert_eq!(p2.get_page_id(), 2);
}

#[test]
fn test_flush_all_pages() {
    let ctx = TestContext::new(4);
    let bpm = &ctx.bpm;

    let mut pids = vec![];
    for i in 0..3u8 {
        let page = bpm.new_page().unwrap();
        page.data().write()[0] = i + 1;
        pids.push(page.get_page_id());
        assert!(bpm.unpin_page(page.get_page_id(), true));
    }
    bpm.flush_all_pages();

    for (i, pid) in pids.iter().enumerate() {
        let page = bpm.fetch_page(*pid).unwrap();
        assert_eq!(page.data().read()[0], i as u8 + 1);
        assert!(!page.is_dirty());
        assert!(bpm.unpin_page(*pid, false));
    }
}

#[test]
fn test_parallel_pool_round_robin() {
    let ctx = ParallelTestContext::new(5, 3);
    let bpm = &ctx.bpm;

    assert_eq!(bpm.pool_size(), 15);

    // the first five allocations land on five distinct instances
    let mut residues: Vec<u32> = (0..5)
        .map(|_| bpm.new_page().unwrap().get_page_id() % 5)
        .collect();
    residues.sort_unstable();
    assert_eq!(residues, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_parallel_pool_routes_by_page_id() {
    let ctx = ParallelTestContext::new(3, 4);
    let bpm = &ctx.bpm;

    let mut pids = vec![];
    for i in 0..6u8 {
        let page = bpm.new_page().unwrap();
        page.data().write()[100] = i;
        pids.push(page.get_page_id());
        assert!(bpm.unpin_page(page.get_page_id(), true));
    }

    for (i, pid) in pids.iter().enumerate() {
        let page = bpm.fetch_page(*pid).unwrap();
        assert_eq!(page.data().read()[100], i as u8);
        assert!(bpm.unpin_page(*pid, false));
    }
}
