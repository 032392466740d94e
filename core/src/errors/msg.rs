pub fn schema_not_json() -> String {
    "Schema input is not valid JSON.".to_string()
}

pub fn description_not_json() -> String {
    "Query description input is not valid JSON.".to_string()
}

pub fn unknown_table(name: &str) -> String {
    format!("Unknown table: `{name}`.")
}

pub fn duplicate_table(name: &str) -> String {
    format!("Schema declares table `{name}` more than once.")
}

pub fn unknown_field(field_name: &str, table_name: &str) -> String {
    format!("Field `{field_name}` not found within table `{table_name}`.")
}

pub fn pointer_is_not_a_link(field_name: &str, table_name: &str) -> String {
    format!("Pointer field `{field_name}` of linker `{table_name}` must have type `link` and a target table.")
}

pub fn linker_without_pointers(table_name: &str) -> String {
    format!("Linker table `{table_name}` must declare both pointer fields.")
}

pub fn link_needs_branches(link_name: &str) -> String {
    format!("Link `{link_name}` must connect at least two tables.")
}

pub fn unsupported_value(context: &str) -> String {
    format!("Unsupported value for `{context}`: only strings, numbers, booleans and null are accepted.")
}
