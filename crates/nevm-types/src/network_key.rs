use nevm_macros::new_type;

new_type!(NetworkKey, String, "NetworkKey");
