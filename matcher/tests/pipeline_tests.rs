use matcher::classifier::ClassifierArtifact;
use matcher::normalizer::normalize;
use matcher::persist::{from_bytes, to_bytes};
use matcher::{
    cosine_similarity, rank, CandidatePool, ClassId, Classify, CorpusEntry, Document, Error, FitConfig, LabelTable,
    LinearModel, Mismatch, ModelParams, NearestNeighbors, Pipeline, RoleClassifier, TermVector, TokenizerConfig,
    Vectorize, Vocabulary,
};
use std::collections::BTreeSet;

const CORPUS: [&str; 4] = [
    "python developer sql pandas",
    "java developer spring hibernate",
    "python django sql postgres",
    "java spring microservices kafka",
];

fn vocab() -> Vocabulary {
    Vocabulary::fit(&CORPUS, TokenizerConfig::default(), &FitConfig::default()).unwrap()
}

fn entry(id: &str, text: &str, category: &str, v: &Vocabulary) -> CorpusEntry {
    CorpusEntry { id: id.into(), category: category.into(), document: Document::new(text, v) }
}

fn knn_pipeline(pool: Vec<(&str, &str, &str)>) -> Pipeline {
    let v = vocab();
    let refs = vec![
        (1, v.vectorize(CORPUS[0])),
        (0, v.vectorize(CORPUS[1])),
        (1, v.vectorize(CORPUS[2])),
        (0, v.vectorize(CORPUS[3])),
    ];
    let model = NearestNeighbors::new(v.len(), 3, refs).unwrap();
    let labels = LabelTable::enumerate(["Java Developer", "Python Developer"]);
    let clf = RoleClassifier::new(Box::new(model), labels).unwrap();
    let entries = pool.into_iter().map(|(id, text, cat)| entry(id, text, cat, &v)).collect();
    Pipeline::new(Box::new(v), clf, CandidatePool::new(entries)).unwrap()
}

#[test]
fn scenario_a_closest_candidate_ranks_first() {
    let v = vocab();
    let pool = vec![
        entry("1", "python developer sql", "Python Developer", &v),
        entry("2", "java developer spring", "Python Developer", &v),
    ];
    let query = v.vectorize(&normalize("python sql expert"));

    let top = rank(&query, &pool, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, "1");

    let all = rank(&query, &pool, 2).unwrap();
    assert!(all[0].similarity > all[1].similarity);
    assert_eq!(all[1].id, "2");
}

#[test]
fn scenario_b_no_candidates_for_predicted_role() {
    let p = knn_pipeline(vec![("7", "java spring", "Java Developer")]);
    let err = p.match_job_description("Python engineer with SQL and Django", 3).unwrap_err();
    assert!(matches!(err, Error::NoCandidates { ref role } if role == "Python Developer"));
}

#[test]
fn scenario_c_zero_k_is_invalid() {
    let v = vocab();
    let pool = vec![entry("1", "python", "Python Developer", &v)];
    let q = v.vectorize("python");
    assert!(matches!(rank(&q, &pool, 0), Err(Error::InvalidArgument(_))));
}

struct Rogue {
    dim: usize,
}

impl Classify for Rogue {
    fn predict(&self, _vector: &TermVector) -> matcher::Result<ClassId> { Ok(42) }
    fn class_ids(&self) -> BTreeSet<ClassId> { [0].into_iter().collect() }
    fn dimension(&self) -> usize { self.dim }
}

#[test]
fn scenario_d_undecodable_class_is_config_mismatch() {
    let v = vocab();
    let labels = LabelTable::new(vec![(0, "HR".to_string())]).unwrap();
    let clf = RoleClassifier::new(Box::new(Rogue { dim: v.len() }), labels).unwrap();
    let p = Pipeline::new(Box::new(v), clf, CandidatePool::default()).unwrap();
    let err = p.classify_document("anything at all").unwrap_err();
    assert!(matches!(err, Error::ConfigMismatch(Mismatch::UnknownClass(42))));
}

#[test]
fn match_filters_by_role_and_ranks() {
    let p = knn_pipeline(vec![
        ("1", "java spring kafka", "Java Developer"),
        ("2", "python sql", "python developer"),
        ("3", "python django postgres sql", "Python Developer"),
        ("4", "sql", "Python Developer"),
    ]);
    let m = p.match_job_description("Python + SQL + Django (remote) https://jobs.example.com", 2).unwrap();
    assert_eq!(m.role, "Python Developer");
    assert_eq!(m.pool_size, 3);
    assert_eq!(m.results.len(), 2);
    assert!(m.results.iter().all(|r| r.category.eq_ignore_ascii_case("python developer")));
    assert!(m.results[0].similarity >= m.results[1].similarity);
    assert_eq!(m.results[0].rank, 1);
    assert_eq!(m.results[1].rank, 2);
}

#[test]
fn k_larger_than_pool_returns_everything() {
    let p = knn_pipeline(vec![("1", "python sql", "Python Developer"), ("2", "pandas", "Python Developer")]);
    let m = p.match_job_description("python sql developer", 10).unwrap();
    assert_eq!(m.results.len(), 2);
}

#[test]
fn out_of_vocabulary_query_scores_zero_everywhere() {
    let v = vocab();
    let pool: Vec<CorpusEntry> = CORPUS.iter().enumerate().map(|(i, t)| entry(&i.to_string(), t, "X", &v)).collect();
    let q = v.vectorize(&normalize("Haskell, OCaml & Erlang!"));
    assert!(q.is_zero());
    let out = rank(&q, &pool, pool.len()).unwrap();
    assert!(out.iter().all(|r| r.similarity == 0.0));
    let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3"]);
}

#[test]
fn rank_output_is_sorted_stable_and_bounded() {
    let v = vocab();
    let texts = ["python", "java", "python", "sql python", "kafka", "python"];
    let pool: Vec<CorpusEntry> = texts.iter().enumerate().map(|(i, t)| entry(&i.to_string(), t, "X", &v)).collect();
    let q = v.vectorize("python sql");
    for k in 1..=8 {
        let out = rank(&q, &pool, k).unwrap();
        assert_eq!(out.len(), k.min(pool.len()));
        for w in out.windows(2) {
            assert!(w[0].similarity >= w[1].similarity);
            if w[0].similarity == w[1].similarity {
                let a: usize = w[0].id.parse().unwrap();
                let b: usize = w[1].id.parse().unwrap();
                assert!(a < b, "tie order broken at k={k}");
            }
        }
    }
}

#[test]
fn self_similarity_is_one() {
    let v = vocab();
    for text in CORPUS {
        let vec = v.vectorize(text);
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 1e-5);
    }
}

#[test]
fn normalization_is_idempotent() {
    let samples = [
        "RT @user: Looking for #Python devs!!! https://t.co/x cc @hr",
        "Résumé — Senior Java Engineer (10+ yrs) :: Spring/Hibernate",
        "\t\n  spaces   everywhere \r\n",
        "",
        "plain text",
    ];
    for s in samples {
        let once = normalize(s);
        assert_eq!(normalize(&once), once);
        assert_eq!(normalize(s), once);
    }
}

#[test]
fn artifacts_round_trip_through_bytes() {
    let v = vocab();
    let back: Vocabulary = from_bytes(&to_bytes(&v).unwrap()).unwrap();
    assert_eq!(back, v);

    let a = v.vectorize(CORPUS[0]);
    let b = v.vectorize(CORPUS[1]);
    let artifact = ClassifierArtifact {
        model: ModelParams::Linear(LinearModel::nearest_centroid(v.len(), &[(3, &a), (9, &b)]).unwrap()),
        labels: LabelTable::new(vec![(3, "Python Developer".to_string()), (9, "Java Developer".to_string())]).unwrap(),
    };
    let back: ClassifierArtifact = from_bytes(&to_bytes(&artifact).unwrap()).unwrap();
    assert_eq!(back, artifact);
    let clf = back.into_classifier().unwrap();
    assert_eq!(clf.classify(&v.vectorize("pandas sql")).unwrap(), "Python Developer");
}
