use cruce::config::ConfigurationValue;

/*
    Auxiliary functions to create the configuration trees for the tests. Each function has a
    struct as argument which contains the needed parameters.
*/

/// Encapsulates the parameters needed to create a mesh network.
pub struct MeshBuilder {
    pub num_rows: usize,
    pub num_cols: usize,
    pub virt_nets: usize,
    pub vcs_per_vnet: usize,
    pub buffers_per_ctrl_vc: usize,
    pub buffers_per_data_vc: usize,
    pub routing_algorithm: &'static str,
    pub link_latency: usize,
    pub interfaces_per_router: usize,
    pub ordered_vnets: Vec<usize>,
    pub pipeline: &'static str,
}

impl Default for MeshBuilder {
    fn default() -> MeshBuilder {
        MeshBuilder {
            num_rows: 2,
            num_cols: 2,
            virt_nets: 1,
            vcs_per_vnet: 4,
            buffers_per_ctrl_vc: 1,
            buffers_per_data_vc: 4,
            routing_algorithm: "XY",
            link_latency: 1,
            interfaces_per_router: 1,
            ordered_vnets: vec![],
            pipeline: "OneCycle",
        }
    }
}

/// Creates a ConfigurationValue with the parameters for the mesh network.
pub fn create_mesh(arg: MeshBuilder) -> ConfigurationValue {
    ConfigurationValue::Object("Mesh".to_string(), vec![
        ("num_rows".to_string(), ConfigurationValue::Number(arg.num_rows as f64)),
        ("num_cols".to_string(), ConfigurationValue::Number(arg.num_cols as f64)),
        ("virt_nets".to_string(), ConfigurationValue::Number(arg.virt_nets as f64)),
        ("vcs_per_vnet".to_string(), ConfigurationValue::Number(arg.vcs_per_vnet as f64)),
        ("buffers_per_ctrl_vc".to_string(), ConfigurationValue::Number(arg.buffers_per_ctrl_vc as f64)),
        ("buffers_per_data_vc".to_string(), ConfigurationValue::Number(arg.buffers_per_data_vc as f64)),
        ("routing_algorithm".to_string(), ConfigurationValue::Literal(arg.routing_algorithm.to_string())),
        ("link_latency".to_string(), ConfigurationValue::Number(arg.link_latency as f64)),
        ("interfaces_per_router".to_string(), ConfigurationValue::Number(arg.interfaces_per_router as f64)),
        ("ordered_vnets".to_string(), ConfigurationValue::Array(
            arg.ordered_vnets.iter().map(|&vnet| ConfigurationValue::Number(vnet as f64)).collect())),
        ("pipeline".to_string(), ConfigurationValue::Literal(arg.pipeline.to_string())),
    ])
}

/// Creates the whole Configuration object around a network description.
pub fn create_configuration(random_seed: u64, cycles: u64, network: ConfigurationValue) -> ConfigurationValue {
    ConfigurationValue::Object("Configuration".to_string(), vec![
        ("random_seed".to_string(), ConfigurationValue::Number(random_seed as f64)),
        ("cycles".to_string(), ConfigurationValue::Number(cycles as f64)),
        ("network".to_string(), network),
    ])
}

/// Reads a numeric field out of a Result object.
pub fn result_number(results: &ConfigurationValue, field: &str) -> f64 {
    if let &ConfigurationValue::Object(ref name, ref pairs) = results {
        assert_eq!(name, "Result");
        for (key, value) in pairs.iter() {
            if key == field {
                return value.as_f64().expect("the field is not a number");
            }
        }
        panic!("field {} not present in the results", field);
    }
    panic!("results are not a Result object");
}
