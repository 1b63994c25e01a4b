mod common;

use std::sync::Arc;
use std::time::Duration;

use h2notifier::cache::QueryKey;
use h2notifier::common::{Installment, InstallmentInput, PersonRole};
use h2notifier::network::Method;
use h2notifier::ui::InstallmentFilter;

use common::{FakeBackend, app, date, person};

fn seeded() -> Arc<FakeBackend> {
    let backend = FakeBackend::new();
    backend.add_person(person(1, "Carla", PersonRole::Collector));
    backend.add_person(person(2, "Bruno", PersonRole::Debtor));
    backend.add_person(person(3, "Diego", PersonRole::Debtor));
    backend.add_installment(5, "Aluguel", date(2025, 6, 10), 1200.0, 1, &[2, 3]);
    backend.add_installment(7, "Internet", date(2025, 6, 20), 150.0, 1, &[2]);
    backend.add_installment(9, "Luz", date(2025, 6, 10), 90.0, 1, &[3]);
    backend
}

fn ids(list: &[Installment]) -> Vec<i64> {
    list.iter().map(|item| item.id).collect()
}

/// Lets spawned background refetches run to completion.
async fn settle_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn different_parameters_get_independent_entries() {
    let backend = seeded();
    let app = app(&backend);

    let by_bruno = app.installments.by_debtor(2);
    let by_diego = app.installments.by_debtor(3);
    let bruno = by_bruno.fetch().await.into_result().unwrap();
    let diego = by_diego.fetch().await.into_result().unwrap();
    assert_eq!(ids(&bruno), vec![5, 7]);
    assert_eq!(ids(&diego), vec![5, 9]);

    drop(by_bruno);
    app.client.invalidate(QueryKey::InstallmentsByDebtor(2));

    let diego_state = by_diego.state();
    assert!(!diego_state.is_stale);
    assert_eq!(by_diego.fetch().await.data.map(|list| ids(&list)), Some(vec![5, 9]));
    assert_eq!(backend.calls(Method::Get, "/parcelas/devedor/3"), 1);

    let again = app.installments.by_debtor(2).fetch().await;
    assert_eq!(again.data.map(|list| ids(&list)), Some(vec![5, 7]));
    assert_eq!(backend.calls(Method::Get, "/parcelas/devedor/2"), 2);
}

#[tokio::test]
async fn zero_id_stays_idle_until_given_a_real_id() {
    let backend = seeded();
    let app = app(&backend);

    let query = app.installments.by_id(0);
    assert!(!query.fetch().await.is_enabled());
    assert_eq!(backend.total_calls(), 0);

    let installment = query.rebind(5).await.into_result().unwrap();
    assert_eq!(installment.description, "Aluguel");
    assert_eq!(backend.calls(Method::Get, "/parcelas/5"), 1);
    assert_eq!(backend.total_calls(), 1);
}

#[tokio::test]
async fn missing_due_date_issues_no_request() {
    let backend = seeded();
    let app = app(&backend);

    let query = app.installments.by_due_date(None);
    assert!(!query.fetch().await.is_enabled());
    assert_eq!(backend.total_calls(), 0);

    query.set_params(Some(date(2025, 6, 10)));
    let list = query.fetch().await.into_result().unwrap();
    assert_eq!(ids(&list), vec![5, 9]);
    assert_eq!(backend.calls(Method::Get, "/parcelas/vencimento/2025-06-10"), 1);
}

#[tokio::test]
async fn deleted_installment_leaves_cached_lists_at_once() {
    let backend = seeded();
    let app = app(&backend);

    let all = app.installments.all();
    let by_debtor = app.installments.by_debtor(2);
    let by_collector = app.installments.by_collector(1);
    all.fetch().await.into_result().unwrap();
    by_debtor.fetch().await.into_result().unwrap();
    by_collector.fetch().await.into_result().unwrap();

    // Keep the reconciling refetches from landing before we look.
    backend.hold("/parcelas");
    backend.hold("/parcelas/devedor/2");
    backend.hold("/parcelas/cobrador/1");

    app.installments.delete().mutate(7).await.unwrap();
    assert_eq!(backend.calls(Method::Delete, "/parcelas/7"), 1);

    for state in [all.state(), by_debtor.state(), by_collector.state()] {
        let list = state.data.expect("list stays on screen");
        assert!(!ids(&list).contains(&7));
    }
    assert_eq!(ids(&all.state().data.unwrap()), vec![5, 9]);
    assert!(!app.client.contains(&QueryKey::Installment(7)));

    backend.unhold("/parcelas");
    backend.unhold("/parcelas/devedor/2");
    backend.unhold("/parcelas/cobrador/1");
    settle_tasks().await;

    let err = app.installments.by_id(7).fetch().await.into_result().unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn failed_delete_keeps_the_lists() {
    let backend = seeded();
    let app = app(&backend);

    let all = app.installments.all();
    all.fetch().await.into_result().unwrap();

    backend.fail_next("/parcelas/7", 409, "Parcela possui notificações pendentes");
    let err = app.installments.delete().mutate(7).await.unwrap_err();
    assert_eq!(err.to_string(), "Parcela possui notificações pendentes");

    let state = all.state();
    assert_eq!(ids(&state.data.unwrap()), vec![5, 7, 9]);
    assert!(!state.is_stale);
}

#[tokio::test]
async fn failed_update_leaves_cached_record_untouched() {
    let backend = seeded();
    let app = app(&backend);

    let query = app.installments.by_id(5);
    let before = query.fetch().await.into_result().unwrap();

    backend.fail_next("/parcelas/5", 400, "Valor total inválido");
    let input = InstallmentInput {
        collector_id: 1,
        total_amount: -1.0,
        description: "Aluguel".into(),
        due_date: date(2025, 6, 10),
        settled: false,
        pix_key: None,
        debtor_ids: vec![2, 3],
    };
    let mutation = app.installments.update();
    let err = mutation.mutate((5, input)).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(mutation.state().is_error());

    let after = query.state();
    assert!(Arc::ptr_eq(&before, after.data.as_ref().unwrap()));
    assert_eq!(*after.data.unwrap(), *before);
    assert!(!after.is_stale);
    assert_eq!(backend.calls(Method::Get, "/parcelas/5"), 1);
}

#[tokio::test]
async fn settling_refreshes_record_and_totals() {
    let backend = seeded();
    let app = app(&backend);

    let total = app.installments.total_receivable(1);
    assert_eq!(*total.fetch().await.into_result().unwrap(), 1440.0);

    let settled = app.installments.settle().mutate(5).await.unwrap();
    assert!(settled.settled);
    assert_eq!(backend.calls(Method::Put, "/parcelas/5/quitar"), 1);
    settle_tasks().await;

    assert_eq!(*total.fetch().await.into_result().unwrap(), 240.0);
    assert_eq!(backend.calls(Method::Get, "/parcelas/total-a-receber/1"), 2);
}

#[tokio::test]
async fn created_installment_shows_up_in_the_list() {
    let backend = seeded();
    let app = app(&backend);

    let all = app.installments.all();
    assert_eq!(all.fetch().await.into_result().unwrap().len(), 3);

    let input = InstallmentInput {
        collector_id: 1,
        total_amount: 300.0,
        description: "Condomínio".into(),
        due_date: date(2025, 7, 5),
        settled: false,
        pix_key: Some("carla@pix".into()),
        debtor_ids: vec![2, 3],
    };
    let created = app.installments.create().mutate(input).await.unwrap();
    assert_eq!(created.per_debtor_amount, 150.0);

    settle_tasks().await;
    let list = all.fetch().await.into_result().unwrap();
    assert!(ids(&list).contains(&created.id));
}

#[tokio::test]
async fn filter_switches_between_lists() {
    let backend = seeded();
    let app = app(&backend);

    let filter = InstallmentFilter::resolve(None, Some(1), Some(2), false);
    assert_eq!(filter, InstallmentFilter::ByCollector(1));

    let query = app.installments.filtered(filter);
    assert_eq!(query.fetch().await.into_result().unwrap().len(), 3);

    assert!(query.set_params(InstallmentFilter::Overdue));
    let overdue = query.fetch().await.into_result().unwrap();
    assert_eq!(ids(&overdue), vec![5, 9]);

    assert!(query.set_params(InstallmentFilter::ByCollector(1)));
    query.fetch().await;
    assert_eq!(backend.calls(Method::Get, "/parcelas/cobrador/1"), 1);
    assert_eq!(backend.calls(Method::Get, "/parcelas/vencidas"), 1);
}

#[tokio::test]
async fn changing_the_filter_loads_the_new_list() {
    let backend = seeded();
    let app = app(&backend);

    let query = app.installments.filtered(InstallmentFilter::Unfiltered);
    query.fetch().await.into_result().unwrap();

    assert!(query.set_params(InstallmentFilter::ByDebtor(2)));
    settle_tasks().await;

    let state = query.state();
    assert!(state.is_success());
    assert!(!state.is_fetching);
    assert_eq!(state.data.map(|list| ids(&list)), Some(vec![5, 7]));
    assert_eq!(backend.calls(Method::Get, "/parcelas/devedor/2"), 1);

    query.fetch().await;
    assert_eq!(backend.calls(Method::Get, "/parcelas/devedor/2"), 1);
}

#[tokio::test]
async fn concurrent_reads_share_one_request() {
    let backend = seeded();
    let app = app(&backend);
    backend.hold("/parcelas");

    let first = app.installments.all();
    let second = app.installments.all();
    let (a, b) = tokio::join!(first.fetch(), async {
        tokio::task::yield_now().await;
        backend.release("/parcelas");
        second.fetch().await
    });

    assert_eq!(a.data.unwrap().len(), 3);
    assert_eq!(b.data.unwrap().len(), 3);
    assert_eq!(backend.calls(Method::Get, "/parcelas"), 1);
}

#[tokio::test(start_paused = true)]
async fn list_is_served_from_cache_inside_fresh_window() {
    let backend = seeded();
    let app = app(&backend);
    let all = app.installments.all();

    all.fetch().await;
    all.fetch().await;
    assert_eq!(backend.calls(Method::Get, "/parcelas"), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(all.state().is_stale);
    all.fetch().await;
    assert_eq!(backend.calls(Method::Get, "/parcelas"), 2);
}

#[tokio::test]
async fn removed_elsewhere_surfaces_not_found() {
    let backend = seeded();
    let app = app(&backend);

    backend.forget_installment(9);
    let state = app.installments.by_id(9).fetch().await;
    assert!(state.is_error());
    assert!(state.error.unwrap().is_not_found());
}
