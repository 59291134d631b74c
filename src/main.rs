//! Headless demo: a scripted click session against a chest menu, with the
//! generated sync traffic logged as it drains from the outbox.

use anyhow::Result;
use clap::Parser;
use mdcontainer_core::item::{items, max_stack_size};
use mdcontainer_core::{Container, ItemStack, SimpleContainer};
use mdcontainer_menu::{chest_menu, ClickType, Player, SLOT_CLICKED_OUTSIDE};
use mdcontainer_net::PacketSynchronizer;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "mdcontainer", about = "Scripted container session demo")]
struct Args {
    /// Chest rows (1-6).
    #[arg(long, default_value_t = 3)]
    rows: usize,

    /// Number of scripted clicks to run.
    #[arg(long, default_value_t = 40)]
    clicks: u32,

    /// Seed for the scripted click sequence.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn scripted_click(rng: &mut StdRng, slot_count: usize) -> (i32, u8, ClickType) {
    let click = match rng.gen_range(0..10) {
        0..=4 => ClickType::Pickup,
        5..=6 => ClickType::QuickMove,
        7 => ClickType::Swap,
        8 => ClickType::Throw,
        _ => ClickType::PickupAll,
    };
    let slot = if click == ClickType::Pickup && rng.gen_ratio(1, 10) {
        SLOT_CLICKED_OUTSIDE
    } else {
        rng.gen_range(0..slot_count as i32)
    };
    let button = if click == ClickType::Swap {
        rng.gen_range(0..9)
    } else {
        rng.gen_range(0..2)
    };
    (slot, button, click)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (1..=6).contains(&args.rows),
        "rows must be between 1 and 6, got {}",
        args.rows
    );

    tracing::info!(rows = args.rows, clicks = args.clicks, seed = args.seed, "session starting");

    let chest = Rc::new(RefCell::new(SimpleContainer::new(args.rows * 9)));
    let mut rng = StdRng::seed_from_u64(args.seed);
    {
        let mut chest = chest.borrow_mut();
        let cells = chest.size();
        for cell in 0..cells {
            if rng.gen_ratio(1, 3) {
                let item = [items::STONE, items::APPLE, items::ENDER_PEARL, items::IRON_SWORD]
                    [rng.gen_range(0..4)];
                let count = rng.gen_range(1..=max_stack_size(item));
                chest.set_item(cell, ItemStack::new(item, count));
            }
        }
    }

    let mut player = Player::new("demo");
    let mut menu = chest_menu(1, args.rows, chest.clone(), &player);
    let (sync, outbox) = PacketSynchronizer::new();
    menu.set_synchronizer(Box::new(sync));

    let starting_total = chest.borrow().total_count() + player.inventory_count();
    let mut messages = 0usize;

    for step in 0..args.clicks {
        let (slot, button, click) = scripted_click(&mut rng, menu.slot_count());
        menu.clicked(slot, button, click, &mut player)?;
        menu.broadcast_changes();

        while let Some(msg) = {
            let mut queue = outbox.borrow_mut();
            queue.pop_front()
        } {
            messages += 1;
            tracing::debug!(step, ?msg, "clientbound");
        }
    }

    menu.removed(&mut player);

    let dropped: u64 = player.dropped().iter().map(|s| u64::from(s.count)).sum();
    let final_total = chest.borrow().total_count() + player.inventory_count() + dropped;
    tracing::info!(
        clicks = args.clicks,
        messages,
        starting_total,
        final_total,
        dropped,
        "session complete"
    );
    anyhow::ensure!(
        starting_total == final_total,
        "item conservation violated: {} -> {}",
        starting_total,
        final_total
    );

    Ok(())
}
