use super::*;

#[test]
fn all_kinds_are_indexed_densely() {
    for (i, k) in Kind::ALL.iter().enumerate() {
        assert_eq!(k.index(), i, "{k} out of place");
    }
}

#[test]
fn names_are_unique_and_resolve() {
    let reg = NodeRegistry::new();
    assert_eq!(reg.len(), Kind::COUNT);
    for r in reg.iter() {
        assert_eq!(reg.lookup(r.name).map(|x| x.kind), Some(r.kind));
    }
    assert_eq!(
        reg.lookup("Constant").map(|r| r.kind),
        Some(Kind::Constant)
    );
    assert!(reg.lookup("FunctionNoSuchThing").is_none());
}

#[test]
fn contracts_match_known_shapes() {
    let c = Kind::Constant.contract();
    assert_eq!((c.params, c.args, c.iterative), (3, 0, false));
    assert!(c.classification.contains(Classification::CORE));

    let t = Kind::Top.contract();
    assert_eq!((t.params, t.args), (24, 1));

    let j = Kind::JuliabrotChoose.contract();
    assert_eq!((j.params, j.args, j.iterative), (16, 2, true));
    assert!(j.classification.contains(Classification::FRACTAL));
    assert!(j.classification.contains(Classification::ITERATIVE));
}

#[test]
fn iterative_flag_matches_classification() {
    for k in Kind::ALL {
        let c = k.contract();
        assert_eq!(
            c.iterative,
            c.classification.intersects(Classification::ITERATIVE),
            "{k}"
        );
    }
}
