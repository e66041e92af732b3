mod common;

use proptest::prelude::*;

use common::*;
use eventual_catalog::{
    core::facade::CatalogFacade,
    engine::enforcer::Enforcer,
    info::{CatalogInfo, Info},
    types::InfoType,
};

#[derive(Debug, Clone)]
enum Action {
    Add(CatalogInfo),
    DefaultWorkspace,
    DefaultDataStore,
}

/// A connected object graph where every reference is a placeholder.
fn actions() -> Vec<Action> {
    vec![
        Action::Add(workspace("ws-a", "wsA")),
        Action::Add(namespace("ns-a", "nsA")),
        Action::Add(data_store("ds-a", "dsA", placeholder("ws-a", InfoType::Workspace))),
        Action::Add(feature_type(
            "ft-a",
            "ftA",
            placeholder("ns-a", InfoType::Namespace),
            placeholder("ds-a", InfoType::DataStore),
        )),
        Action::Add(style("style-1", "style1")),
        Action::Add(layer(
            "layer-a",
            "layerA",
            placeholder("ft-a", InfoType::FeatureType),
            placeholder("style-1", InfoType::Style),
        )),
        Action::Add(layer_group("lg-1", "group1", vec![placeholder("layer-a", InfoType::Layer)])),
        Action::DefaultWorkspace,
        Action::DefaultDataStore,
    ]
}

fn apply(enforcer: &Enforcer, action: Action) {
    let res = match action {
        Action::Add(info) => enforcer.add(info).map(|_| ()),
        Action::DefaultWorkspace => {
            enforcer.set_default_workspace(Some(Info::placeholder("ws-a", InfoType::Workspace)))
        }
        Action::DefaultDataStore => enforcer.set_default_data_store(
            Info::placeholder("ws-a", InfoType::Workspace),
            Some(Info::placeholder("ds-a", InfoType::DataStore)),
        ),
    };
    res.expect("apply action");
}

fn expected_objects() -> Vec<CatalogInfo> {
    let (catalog, enforcer) = setup();
    for action in actions() {
        apply(&enforcer, action);
    }
    catalog.objects()
}

proptest! {
    #[test]
    fn any_arrival_order_converges_to_the_same_catalog(order in Just(actions()).prop_shuffle()) {
        let (catalog, enforcer) = setup();
        for action in order {
            apply(&enforcer, action);
        }

        prop_assert!(enforcer.is_converged());
        prop_assert_eq!(enforcer.pending_operations(), 0);
        prop_assert_eq!(catalog.objects(), expected_objects());
        prop_assert!(catalog.objects().iter().all(|info| !info.has_placeholders()));
        prop_assert_eq!(catalog.default_workspace().map(|ws| ws.id), Some("ws-a".to_owned()));
        prop_assert_eq!(catalog.default_data_store("ws-a").map(|ds| ds.id), Some("ds-a".to_owned()));
    }

    #[test]
    fn duplicate_deliveries_do_not_change_the_outcome(
        order in Just(actions().into_iter().chain(actions()).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let (catalog, enforcer) = setup();
        for action in order {
            apply(&enforcer, action);
        }

        prop_assert!(enforcer.is_converged());
        prop_assert_eq!(catalog.objects(), expected_objects());
    }

    #[test]
    fn pending_refs_name_only_absent_objects(prefix in 0usize..9, order in Just(actions()).prop_shuffle()) {
        let (catalog, enforcer) = setup();
        for action in order.into_iter().take(prefix) {
            apply(&enforcer, action);
        }

        for id in enforcer.pending_refs() {
            prop_assert!(catalog.get(&id).is_none(), "{} is present but still pending", id);
        }
        prop_assert_eq!(enforcer.is_converged(), enforcer.pending_refs().is_empty());
    }
}

#[test]
fn reverse_dependency_order_converges_only_on_the_last_event() {
    let (catalog, enforcer) = setup();
    let mut reversed = actions();
    reversed.reverse();
    let last = reversed.len() - 1;

    for (i, action) in reversed.into_iter().enumerate() {
        apply(&enforcer, action);
        assert_eq!(enforcer.is_converged(), i == last, "after event {i}");
    }
    for id in ["ws-a", "ns-a", "ds-a", "ft-a", "style-1", "layer-a", "lg-1"] {
        assert!(catalog.get(id).is_some(), "{id} missing");
    }
}
