//! # Event Bus Flows
//!
//! Multi-producer delivery, routing order across the four subscription keys,
//! consumer isolation, and the platform lifecycle driven by the runtime
//! container.

#[cfg(test)]
mod tests {
    use kernel_bus::{BusConfig, EventBus, EventConsumer, SubscriptionKey};
    use kernel_runtime::{KernelConfig, KernelContainer};
    use kernel_types::{ComponentId, Event, EventType};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Log = Arc<Mutex<Vec<String>>>;

    /// Consumer that appends `label` to a shared log for every event.
    fn labelled(log: &Log, label: &'static str) -> Arc<dyn EventConsumer> {
        let log = Arc::clone(log);
        Arc::new(move |_: &Event| -> anyhow::Result<()> {
            log.lock().push(label.to_string());
            Ok(())
        })
    }

    /// Consumer that records `originator:description`.
    fn recorder(log: &Log) -> Arc<dyn EventConsumer> {
        let log = Arc::clone(log);
        Arc::new(move |event: &Event| -> anyhow::Result<()> {
            let origin = event.originator().map_or("-", |o| o.as_str());
            log.lock().push(format!("{origin}:{}", event.description()));
            Ok(())
        })
    }

    fn small_bus(capacity: usize) -> EventBus {
        EventBus::start(BusConfig {
            capacity,
            ..BusConfig::default()
        })
        .unwrap()
    }

    // =============================================================================
    // DELIVERY ORDER
    // =============================================================================

    /// Several producers hammering a small queue: nothing is lost and each
    /// producer's events arrive in the order it published them.
    #[test]
    fn test_multi_producer_per_producer_fifo() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 250;

        let bus = Arc::new(small_bus(8));
        let log: Log = Arc::default();
        bus.subscribe(recorder(&log), None, None);

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    let origin = ComponentId::new(format!("producer-{p}"));
                    for seq in 0..PER_PRODUCER {
                        bus.publish(Event::new(Some(origin.clone()), "load.tick", seq.to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        bus.close();

        let log = log.lock();
        assert_eq!(log.len(), PRODUCERS * PER_PRODUCER);
        for p in 0..PRODUCERS {
            let prefix = format!("producer-{p}:");
            let seqs: Vec<usize> = log
                .iter()
                .filter_map(|entry| entry.strip_prefix(&prefix))
                .map(|seq| seq.parse().unwrap())
                .collect();
            assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    /// Consumers are called in key order: exact/exact, exact/any, any/exact,
    /// any/any. Registration order only matters within one key.
    #[test]
    fn test_routing_order_across_keys() {
        let bus = small_bus(16);
        let log: Log = Arc::default();
        let importer = ComponentId::new("importer");
        let imported = EventType::new("doc.imported");

        // Register in reverse of the expected call order
        bus.subscribe_key(labelled(&log, "any/any"), SubscriptionKey::all());
        bus.subscribe_key(labelled(&log, "any/type"), SubscriptionKey::of_type(imported.clone()));
        bus.subscribe_key(
            labelled(&log, "origin/any"),
            SubscriptionKey::from_originator(importer.clone()),
        );
        bus.subscribe(
            labelled(&log, "origin/type"),
            Some(importer.clone()),
            Some(imported.clone()),
        );
        bus.subscribe(labelled(&log, "origin/type#2"), Some(importer.clone()), Some(imported));

        bus.publish(Event::new(Some(importer), "doc.imported", "spec.docx"));
        bus.close();

        assert_eq!(
            *log.lock(),
            vec!["origin/type", "origin/type#2", "origin/any", "any/type", "any/any"]
        );
    }

    /// An event without an originator reaches only the wildcard-originator
    /// subscriptions, each exactly once.
    #[test]
    fn test_anonymous_event_routing() {
        let bus = small_bus(16);
        let log: Log = Arc::default();

        bus.subscribe(labelled(&log, "origin/any"), Some(ComponentId::new("importer")), None);
        bus.subscribe(labelled(&log, "any/type"), None, Some("doc.imported".into()));
        bus.subscribe(labelled(&log, "any/other"), None, Some("doc.deleted".into()));
        bus.subscribe(labelled(&log, "any/any"), None, None);

        bus.publish(Event::new(None, "doc.imported", "anonymous"));
        bus.close();

        assert_eq!(*log.lock(), vec!["any/type", "any/any"]);
    }

    // =============================================================================
    // CONSUMER ISOLATION
    // =============================================================================

    #[test]
    fn test_failing_consumers_do_not_starve_others() {
        let bus = small_bus(16);
        let log: Log = Arc::default();

        bus.subscribe(
            Arc::new(|_: &Event| -> anyhow::Result<()> { anyhow::bail!("store offline") }),
            None,
            None,
        );
        bus.subscribe(
            Arc::new(|event: &Event| -> anyhow::Result<()> {
                if event.description() == "boom" {
                    panic!("consumer bug");
                }
                Ok(())
            }),
            None,
            None,
        );
        bus.subscribe(recorder(&log), None, None);

        for description in ["one", "boom", "two"] {
            bus.publish(Event::new(None, "work", description));
        }
        bus.close();

        assert_eq!(*log.lock(), vec!["-:one", "-:boom", "-:two"]);
        assert_eq!(bus.events_dispatched(), 3);
        assert_eq!(bus.consumer_failures(), 4);
    }

    // =============================================================================
    // PLATFORM LIFECYCLE
    // =============================================================================

    #[test]
    fn test_container_lifecycle() {
        let container = KernelContainer::new(KernelConfig::default()).unwrap();
        let log: Log = Arc::default();
        container.bus.subscribe(recorder(&log), None, None);

        container.start();
        container.bus.publish(Event::new(
            Some(ComponentId::new("bot-management")),
            "bot.registered",
            "crawler",
        ));
        container.shutdown();

        let snapshot = container.lifecycle.snapshot();
        assert_eq!(snapshot.started, 1);
        assert_eq!(snapshot.shutdown, 1);
        assert_eq!(
            *log.lock(),
            vec![
                "kernel.platform:Platform started",
                "bot-management:crawler",
                "kernel.platform:Platform shutting down",
            ]
        );

        // The dispatcher is gone; late events are counted, not delivered
        container.bus.publish(Event::new(None, "late", "after shutdown"));
        assert_eq!(container.bus.events_dropped(), 1);
        assert_eq!(log.lock().len(), 3);
    }

    /// A shutdown event published by any component stops dispatch; events
    /// queued behind it are not delivered.
    #[test]
    fn test_shutdown_sentinel_stops_dispatch() {
        let bus = small_bus(16);
        let log: Log = Arc::default();
        let gate = Arc::new(Mutex::new(()));

        // Hold the dispatcher on the first event so the rest queue up
        let held = gate.lock();
        let gate_for_consumer = Arc::clone(&gate);
        bus.subscribe(
            Arc::new(move |_: &Event| -> anyhow::Result<()> {
                drop(gate_for_consumer.lock());
                Ok(())
            }),
            None,
            Some("first".into()),
        );
        bus.subscribe(recorder(&log), None, None);

        bus.publish(Event::new(None, "first", "a"));
        bus.publish(Event::platform_shutdown(ComponentId::new("ops")));
        bus.publish(Event::new(None, "after", "b"));
        drop(held);

        bus.close();
        assert_eq!(*log.lock(), vec!["-:a", "ops:Platform shutting down"]);
    }
}
