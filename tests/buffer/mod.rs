mod buffer_pool_manager_tests;
mod lru_replacer_tests;
