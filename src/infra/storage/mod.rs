pub mod b2_object_store;
