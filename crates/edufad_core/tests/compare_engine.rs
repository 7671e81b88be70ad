mod common;

use common::{checklist, context, date, editor, response, FakeApi};
use edufad_core::service::compare::{compare, CompareError, CompareOptions};
use edufad_core::{Assessment, ComparisonDelta, Response};
use std::sync::Arc;

fn negated(deltas: &[ComparisonDelta]) -> Vec<ComparisonDelta> {
    deltas
        .iter()
        .map(|delta| ComparisonDelta {
            item_id: delta.item_id.clone(),
            delta: -delta.delta,
        })
        .collect()
}

#[test]
fn swapping_sides_negates_every_delta() {
    let checklist = checklist(&[("C1", &["I1", "I2"]), ("C2", &["I3", "I4"])]);
    let cases: Vec<(Vec<Response>, Vec<Response>)> = vec![
        (vec![], vec![]),
        (vec![response("a", "I1", 3)], vec![]),
        (
            vec![response("a", "I1", 0), response("a", "I4", 2)],
            vec![response("b", "I1", 3), response("b", "I3", 1)],
        ),
        (
            vec![
                response("a", "I1", 1),
                response("a", "I2", 1),
                response("a", "I3", 1),
                response("a", "I4", 1),
            ],
            vec![
                response("b", "I4", 0),
                response("b", "I3", 3),
                response("b", "I2", 2),
                response("b", "I1", 1),
            ],
        ),
    ];

    for (a, b) in cases {
        let forward = compare(&checklist, &a, &b).unwrap();
        let backward = compare(&checklist, &b, &a).unwrap();
        assert_eq!(forward, negated(&backward));
    }
}

#[test]
fn output_is_in_checklist_order() {
    let checklist = checklist(&[("C1", &["I1", "I2"]), ("C2", &["I3"])]);
    let deltas = compare(
        &checklist,
        &[response("a", "I3", 0), response("a", "I1", 2)],
        &[response("b", "I2", 1)],
    )
    .unwrap();
    let ids: Vec<_> = deltas.iter().map(|delta| delta.item_id.as_str()).collect();
    assert_eq!(ids, vec!["I1", "I2", "I3"]);
}

fn api_with_deleted_b() -> Arc<FakeApi> {
    let mut deleted = Assessment::draft("b", "s1", date(3, 2));
    deleted.soft_delete();
    Arc::new(
        FakeApi::new(checklist(&[("C1", &["I1"])]), editor())
            .with_assessment(
                Assessment::draft("a", "s1", date(3, 1)),
                vec![response("a", "I1", 1)],
            )
            .with_assessment(deleted, vec![response("b", "I1", 3)]),
    )
}

#[tokio::test]
async fn deleted_assessments_are_refused_unless_allowed() {
    let api = api_with_deleted_b();
    let ctx = context(&api, editor(), checklist(&[("C1", &["I1"])]));

    let err = ctx
        .compare()
        .compare_assessments("a", "b", CompareOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, CompareError::DeletedAssessment("b".to_string()));

    let deltas = ctx
        .compare()
        .compare_assessments(
            "a",
            "b",
            CompareOptions {
                allow_deleted: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        deltas,
        vec![ComparisonDelta {
            item_id: "I1".to_string(),
            delta: 2,
        }]
    );
}

#[tokio::test]
async fn remote_deltas_come_back_in_checklist_order() {
    let checklist = checklist(&[("C1", &["I1", "I2"])]);
    let api = Arc::new(FakeApi::new(checklist.clone(), editor()));
    api.set_remote_deltas(vec![
        ComparisonDelta {
            item_id: "I2".to_string(),
            delta: -1,
        },
        ComparisonDelta {
            item_id: "I1".to_string(),
            delta: 2,
        },
    ]);
    let ctx = context(&api, editor(), checklist);

    let deltas = ctx.compare().remote_compare("a", "b").await.unwrap();
    assert_eq!(deltas[0].item_id, "I1");
    assert_eq!(deltas[1].item_id, "I2");
}
