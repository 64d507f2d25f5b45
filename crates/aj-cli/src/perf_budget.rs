use std::time::Instant;

use aj_core::classifier::{classify, site_patterns};
use aj_core::{RedirectMode, RedirectPolicy, Settings, SiteRegistry};

pub struct PerfBudgetOptions {
    pub iterations: usize,
}

const BUDGET_COLD_START_MS: f64 = 100.0;
const BUDGET_CLASSIFY_P99_US: f64 = 200.0;
const BUDGET_DECIDE_P99_US: f64 = 250.0;

const BUDGET_URLS: &[&str] = &[
    "https://www.nytimes.com/2024/01/15/us/politics/story.html",
    "https://www.nytimes.com/",
    "https://www.wsj.com/articles/markets-rally-on-earnings-11700000000",
    "https://www.economist.com/subscribe/offer-2024",
    "https://www.theguardian.com/world/2023/oct/12/some-long-headline-here",
    "https://www.bloomberg.com/technology",
    "https://archive.ph/newest/https://www.ft.com/content/abc",
    "https://example.com/not-a-real-url-but-long-enough-path",
];

pub fn run_perf_budget(registry: &SiteRegistry, opts: PerfBudgetOptions) -> Result<(), String> {
    println!("Performance Budget Check");
    println!("==================================================");

    println!("Building tables...");
    let cold_start_begin = Instant::now();
    let cold_registry = SiteRegistry::new(registry.domains());
    let pattern_sites = site_patterns().len();
    let cold_start_ms = cold_start_begin.elapsed().as_secs_f64() * 1000.0;
    println!("  {} sites, {} site pattern groups", cold_registry.len(), pattern_sites);

    let policy = RedirectPolicy::new(&cold_registry);
    let settings = Settings { enabled: true, redirect_mode: RedirectMode::Automatic };

    println!("Warming up...");
    for _ in 0..1000 {
        for url in BUDGET_URLS {
            let _ = policy.evaluate(url, &settings);
        }
    }

    println!("Measuring latency...");
    let classify_latencies = measure(opts.iterations, |url| {
        let _ = classify(url);
    });
    let decide_latencies = measure(opts.iterations, |url| {
        let _ = policy.evaluate(url, &settings);
    });

    let mut passed = true;
    println!();
    println!("Results");
    println!("--------------------------------------------------");

    passed &= report_budget("Cold Start", cold_start_ms, BUDGET_COLD_START_MS, "ms");
    passed &= report_budget("Classify P99 Latency", percentile(&classify_latencies, 0.99), BUDGET_CLASSIFY_P99_US, "μs");
    passed &= report_budget("Decide P99 Latency", percentile(&decide_latencies, 0.99), BUDGET_DECIDE_P99_US, "μs");

    println!();
    println!("==================================================");

    if passed {
        println!("✓ All performance budgets passed");
        Ok(())
    } else {
        Err("Performance budget exceeded".to_string())
    }
}

fn report_budget(name: &str, actual: f64, limit: f64, unit: &str) -> bool {
    let passed = actual <= limit;
    let status = if passed { "✓" } else { "✗" };
    println!(
        "{} {}: {:.2} {} (limit: {:.2} {})",
        status, name, actual, unit, limit, unit
    );
    passed
}

fn measure(iterations: usize, mut op: impl FnMut(&str)) -> Vec<f64> {
    let mut latencies = Vec::with_capacity(iterations * BUDGET_URLS.len());

    for _ in 0..iterations {
        for url in BUDGET_URLS {
            let start = Instant::now();
            op(*url);
            latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    latencies
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
