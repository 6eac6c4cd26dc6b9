/// Map friendly GPU names to the identifiers the RunPod API expects
///
/// Names already in API form pass through unchanged.
pub fn map_gpu_type_ids<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            match name {
                "NVIDIA A4000" => "NVIDIA RTX A4000".to_owned(),
                "NVIDIA RTX 4000" => "NVIDIA RTX 4000 Ada Generation".to_owned(),
                "NVIDIA RTX 3090" => "NVIDIA GeForce RTX 3090".to_owned(),
                "NVIDIA A5000" => "NVIDIA RTX A5000".to_owned(),
                "NVIDIA RTX 4090" => "NVIDIA GeForce RTX 4090".to_owned(),
                other => other.to_owned(),
            }
        })
        .collect()
}

/// GPU types this workload deploys onto by default
pub fn default_gpu_type_ids() -> Vec<String> {
    vec![
        "NVIDIA RTX A4000".to_owned(),
        "NVIDIA GeForce RTX 3090".to_owned(),
        "NVIDIA RTX A5000".to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_names_map_to_api_ids() {
        let mapped = map_gpu_type_ids(["NVIDIA A4000", "NVIDIA RTX 3090"]);
        assert_eq!(mapped, vec!["NVIDIA RTX A4000", "NVIDIA GeForce RTX 3090"]);
    }

    #[test]
    fn api_names_pass_through() {
        let mapped = map_gpu_type_ids(["NVIDIA RTX A5000"]);
        assert_eq!(mapped, vec!["NVIDIA RTX A5000"]);
    }
}
