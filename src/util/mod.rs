pub mod rand_kv;
