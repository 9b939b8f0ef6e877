use pretty_assertions::assert_eq;
use synth_ai::llm::{GenerationParams, Generator};
use synth_ai::render::render_final_response;
use synth_ai::synthesize::{synthesize_answer, SynthesisConfig};
use synth_core::domain::RetrievalResult;
use synth_core::error::AppError;

struct MockGenerator {
    out: String,
}

impl Generator for MockGenerator {
    fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, AppError> {
        Ok(self.out.clone())
    }
}

fn demo_results() -> Vec<RetrievalResult> {
    let raw = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/demo/results_sample.json"
    ));
    serde_json::from_str(raw).expect("demo results")
}

const DEMO_ANSWER: &str = "Port capacity is the binding constraint for North Sea offshore wind \
projects [C1][24:53-25:28], while interconnector queues keep lengthening [C2][Page 17]. \
Dr. Marsh frames both as symptoms of under-planned grid build-out [S1].";

#[test]
fn rendering_matches_golden_fixture() {
    let golden = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/golden/answer_demo.txt"
    ));

    let llm = MockGenerator {
        out: DEMO_ANSWER.to_string(),
    };
    let config = SynthesisConfig::new("mock-model");
    let res = synthesize_answer(
        "What limits North Sea offshore wind build-out?",
        &demo_results(),
        &config,
        &llm,
    )
    .expect("synthesis");

    assert!(res.warnings.is_empty());
    assert_eq!(render_final_response(&res), golden);
}

#[test]
fn rendering_is_idempotent() {
    let llm = MockGenerator {
        out: DEMO_ANSWER.to_string(),
    };
    let config = SynthesisConfig::new("mock-model");
    let res = synthesize_answer("q", &demo_results(), &config, &llm).expect("synthesis");

    assert_eq!(render_final_response(&res), render_final_response(&res));
}

#[test]
fn rendered_labels_match_assigned_labels() {
    let llm = MockGenerator {
        out: DEMO_ANSWER.to_string(),
    };
    let config = SynthesisConfig::new("mock-model");
    let res = synthesize_answer("q", &demo_results(), &config, &llm).expect("synthesis");
    let rendering = render_final_response(&res);

    for s in &res.summaries {
        assert!(rendering.contains(&format!("[{}] {}", s.label, s.title)));
    }
    for c in &res.chunks {
        assert!(rendering.contains(&format!("[{}] {}", c.label, c.source_ref)));
    }
    assert!(rendering.contains("Results: 3 (1 summaries, 2 chunks)"));
}

#[test]
fn chunk_excerpts_are_capped_in_the_reference_list() {
    let mut results = demo_results();
    if let Some(chunk) = results.iter_mut().find(|r| r.id == "chunk_0042") {
        chunk.text = Some("y".repeat(400));
    }

    let llm = MockGenerator {
        out: DEMO_ANSWER.to_string(),
    };
    let config = SynthesisConfig::new("mock-model");
    let res = synthesize_answer("q", &results, &config, &llm).expect("synthesis");
    let rendering = render_final_response(&res);

    let truncated = format!("{}...", "y".repeat(200));
    assert!(rendering.contains(&truncated));
    assert!(!rendering.contains(&"y".repeat(201)));
}
