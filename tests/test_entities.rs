use irq_shooter::bullets::BulletList;
use irq_shooter::entities::*;
use irq_shooter::pool::EnemyPool;
use irq_shooter::sprite::SpriteId;

fn ground_pool(capacity: usize) -> EnemyPool {
    EnemyPool::new(Enemy::template(EnemyKind::Ground, 5, 1, (90, 90)), capacity)
}

fn fill(pool: &mut EnemyPool) {
    for i in 0..pool.capacity() {
        assert_eq!(pool.spawn(i as i32 * 10, 0), Some(i));
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

#[test]
fn rect_contains_is_half_open() {
    let r = Rect::new(10, 10, 5, 5);
    assert!(r.contains(10, 10));
    assert!(r.contains(14, 14));
    assert!(!r.contains(15, 10));
    assert!(!r.contains(10, 15));
}

#[test]
fn rect_overlap_needs_shared_area() {
    let a = Rect::new(0, 0, 10, 10);
    assert!(a.overlaps(&Rect::new(9, 9, 5, 5)));
    assert!(!a.overlaps(&Rect::new(10, 0, 5, 5)));
    assert_eq!(a.center(), (5, 5));
}

#[test]
fn enemy_kind_picks_its_sprite() {
    assert_eq!(EnemyKind::Ground.sprite(), SpriteId::GroundEnemy);
    assert_eq!(EnemyKind::Flying.sprite(), SpriteId::FlyingEnemy);
    let template = Enemy::template(EnemyKind::Flying, 5, 1, (100, 60));
    assert!(!template.alive);
    assert_eq!(template.bounds(), Rect::new(0, 0, 100, 60));
}

// ── Enemy pool ────────────────────────────────────────────────────────────────

#[test]
fn spawn_into_full_pool_is_dropped() {
    let mut pool = ground_pool(10);
    fill(&mut pool);
    assert!(pool.is_full());

    let before: Vec<Enemy> = pool.iter_alive().map(|(_, e)| e.clone()).collect();
    assert_eq!(pool.spawn(500, 500), None);
    let after: Vec<Enemy> = pool.iter_alive().map(|(_, e)| e.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(pool.alive_count(), 10);
}

#[test]
fn killed_slot_is_reused_by_next_spawn() {
    let mut pool = ground_pool(10);
    fill(&mut pool);
    pool.kill(6);
    assert_eq!(pool.alive_count(), 9);

    assert_eq!(pool.spawn(1, 2), Some(6));
    let enemy = pool.get(6).unwrap();
    assert!(enemy.alive);
    assert_eq!((enemy.x, enemy.y), (1, 2));
}

#[test]
fn spawn_takes_lowest_free_slot() {
    let mut pool = ground_pool(4);
    fill(&mut pool);
    pool.kill(3);
    pool.kill(1);
    assert_eq!(pool.spawn(0, 0), Some(1));
    assert_eq!(pool.spawn(0, 0), Some(3));
}

#[test]
fn killing_twice_frees_the_slot_once() {
    let mut pool = ground_pool(2);
    fill(&mut pool);
    pool.kill(0);
    pool.kill(0);
    assert_eq!(pool.spawn(0, 0), Some(0));
    assert_eq!(pool.spawn(0, 0), None);
}

#[test]
fn respawned_enemy_starts_from_template() {
    let mut pool = ground_pool(1);
    pool.spawn(0, 0);
    assert!(!pool.hurt(0, 3));
    assert_eq!(pool.get(0).unwrap().health, 2);
    assert!(pool.hurt(0, 3));
    assert_eq!(pool.alive_count(), 0);

    pool.spawn(0, 0);
    assert_eq!(pool.get(0).unwrap().health, 5);
}

#[test]
fn hurting_a_dead_slot_does_nothing() {
    let mut pool = ground_pool(1);
    assert!(!pool.hurt(0, 100));
    assert!(!pool.hurt(7, 100));
}

#[test]
fn revive_dead_stops_when_full() {
    let mut pool = ground_pool(3);
    pool.spawn(0, 0);
    let mut asked = 0;
    let revived = pool.revive_dead(5, |template| {
        asked += 1;
        (template.width, 7)
    });
    assert_eq!(revived, 2);
    assert_eq!(pool.alive_count(), 3);
    assert_eq!(pool.get(2).unwrap().y, 7);
    assert!(asked >= revived);
}

#[test]
fn clear_kills_everything() {
    let mut pool = ground_pool(5);
    fill(&mut pool);
    pool.clear();
    assert_eq!(pool.alive_count(), 0);
    assert_eq!(pool.iter_alive().count(), 0);
}

// ── Bullet list ───────────────────────────────────────────────────────────────

#[test]
fn fired_bullets_drain_to_empty() {
    let playfield = Rect::new(0, 0, 100, 100);
    let mut list = BulletList::new();
    let fired = 5;
    for i in 0..fired {
        list.fire((10 + i * 10, 90), (10 + i * 10, 0), 7.0 + i as f32, 1, SpriteId::Bullet);
    }
    assert_eq!(list.len(), fired as usize);

    let mut removed = 0;
    for _ in 0..100 {
        removed += list.advance(playfield);
        assert!(list.len() <= fired as usize - removed);
        assert_eq!(list.iter().count(), list.len());
    }
    assert!(list.is_empty());
    assert_eq!(removed, fired as usize);
}

#[test]
fn bullets_never_appear_without_firing() {
    let playfield = Rect::new(0, 0, 100, 100);
    let mut list = BulletList::new();
    for _ in 0..10 {
        list.advance(playfield);
    }
    assert!(list.is_empty());
    assert_eq!(list.iter().count(), 0);
}

#[test]
fn fire_heads_toward_target_at_speed() {
    let mut list = BulletList::new();
    list.fire((0, 0), (30, 40), 10.0, 2, SpriteId::Bullet);
    let bullet = list.iter().next().unwrap();
    assert!((bullet.vx - 6.0).abs() < 1e-4);
    assert!((bullet.vy - 8.0).abs() < 1e-4);
    assert_eq!(bullet.damage, 2);
}

#[test]
fn fire_at_own_position_goes_straight_up() {
    let mut list = BulletList::new();
    list.fire((50, 50), (50, 50), 4.0, 1, SpriteId::Bullet);
    let bullet = list.iter().next().unwrap();
    assert_eq!((bullet.vx, bullet.vy), (0.0, -4.0));
}

#[test]
fn newest_bullet_is_at_the_head() {
    let mut list = BulletList::new();
    list.fire((1, 0), (1, 10), 1.0, 1, SpriteId::Bullet);
    list.fire((2, 0), (2, 10), 1.0, 1, SpriteId::Bullet);
    let xs: Vec<f32> = list.iter().map(|b| b.x).collect();
    assert_eq!(xs, vec![2.0, 1.0]);
}

#[test]
fn retain_reports_removed_count() {
    let mut list = BulletList::new();
    for x in 0..4 {
        list.fire((x, 0), (x, 10), 1.0, 1, SpriteId::Bullet);
    }
    assert_eq!(list.retain(|b| b.x as i32 % 2 == 0), 2);
    assert_eq!(list.len(), 2);
    list.clear();
    assert!(list.is_empty());
}

// ── Score ─────────────────────────────────────────────────────────────────────

#[test]
fn score_starts_at_zero_with_unit_multiplier() {
    let s = Score::default();
    assert_eq!(s.points, 0);
    assert_eq!(s.multiplier, 1.0);
}
