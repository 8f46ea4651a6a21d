mod hash_table_page_tests;
