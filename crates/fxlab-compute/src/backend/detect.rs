//! Backend discovery.

use super::Backend;

/// Information about an execution backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Backend type.
    pub backend: Backend,
    /// Canonical name.
    pub name: &'static str,
    /// Whether the backend can run here.
    pub available: bool,
    /// Preference when several are available (higher = faster).
    pub priority: u32,
    /// Description.
    pub description: &'static str,
}

/// Detects all backends, fastest first.
pub fn detect_backends() -> Vec<BackendInfo> {
    let mut backends = vec![
        BackendInfo {
            backend: Backend::Reference,
            name: Backend::Reference.name(),
            available: true,
            priority: 1,
            description: "Scalar reference loops (ground truth)",
        },
        BackendInfo {
            backend: Backend::CompiledCpu,
            name: Backend::CompiledCpu.name(),
            available: true,
            priority: 20,
            description: "Row-parallel CPU schedules (rayon)",
        },
        BackendInfo {
            backend: Backend::ParallelCompute,
            name: Backend::ParallelCompute.name(),
            available: true,
            priority: 10,
            description: "Work-group dispatch on CPU threads",
        },
    ];

    let gpu_available = Backend::CompiledGpu.is_available();
    backends.push(BackendInfo {
        backend: Backend::CompiledGpu,
        name: Backend::CompiledGpu.name(),
        available: gpu_available,
        priority: if gpu_available { 100 } else { 0 },
        description: if cfg!(feature = "wgpu") {
            "GPU compute shaders via wgpu (Vulkan/Metal/DX12)"
        } else {
            "GPU compute shaders (wgpu feature not enabled)"
        },
    });

    backends.sort_by(|a, b| b.priority.cmp(&a.priority));
    backends
}

/// GPU adapter names in index order. Empty without the `wgpu` feature.
pub fn gpu_adapters() -> Vec<String> {
    #[cfg(feature = "wgpu")]
    {
        super::WgpuBackend::adapters()
    }
    #[cfg(not(feature = "wgpu"))]
    {
        Vec::new()
    }
}

/// Renders [`detect_backends`] as one line per backend.
pub fn describe_backends() -> String {
    let mut desc = String::new();
    for info in detect_backends() {
        let status = if info.available { "+" } else { "-" };
        desc.push_str(&format!("[{}] {:<10} {}\n", status, info.name, info.description));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_backend_listed_once() {
        let found = detect_backends();
        assert_eq!(found.len(), Backend::all().len());
        for &b in Backend::all() {
            assert_eq!(found.iter().filter(|i| i.backend == b).count(), 1);
        }
    }

    #[test]
    fn sorted_by_priority() {
        let found = detect_backends();
        assert!(found.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn description_has_markers() {
        let text = describe_backends();
        assert!(text.contains("[+] reference"));
        assert_eq!(text.lines().count(), Backend::all().len());
    }
}
