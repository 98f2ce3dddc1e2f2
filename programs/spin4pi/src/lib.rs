use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::slot_hashes;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[cfg(not(feature = "no-entrypoint"))]
use solana_security_txt::security_txt;

#[cfg(not(feature = "no-entrypoint"))]
security_txt! {
    name: "Spin4Pi",
    project_url: "https://spin4pi.app",
    contacts: "email:security@spin4pi.app",
    policy: "https://spin4pi.app/terms",
    preferred_languages: "en",
    source_code: "https://github.com/spin4pi/spin4pi-program"
}


// ── Monetary units ────────────────────────────────────────────────────────
// All Pi and S4P amounts are fixed-point micro units: 1 Pi = 1_000_000 uPi.
pub const MICRO_PI: u64 = 1_000_000;

// ── Spin pricing ──────────────────────────────────────────────────────────
pub const BASIC_SPIN_COST: u64 = 100_000;    // 0.10 Pi
pub const PRO_SPIN_COST:   u64 = 250_000;    // 0.25 Pi
pub const VAULT_SPIN_COST: u64 = 1_000_000;  // 1.00 Pi

// ── Wheel rewards ─────────────────────────────────────────────────────────
pub const WIN_SMALL_REWARD: u64 = 100_000;   // 0.1 Pi
pub const WIN_BIG_REWARD:   u64 = 500_000;   // 0.5 Pi

// ── Jackpot ───────────────────────────────────────────────────────────────
// Every paid spin feeds the shared pool; the pool only drains through the
// explicit award_jackpot instruction, never through the spin path.
pub const JACKPOT_BPS: u64 = 500;            // 5% of paid-spin cost

// ── Time windows ──────────────────────────────────────────────────────────
pub const FREE_SPIN_COOLDOWN_SECS: i64 = 86_400;
pub const DAY_SECS:                i64 = 86_400;
pub const STREAK_GRACE_SECS:       i64 = 172_800;  // miss a day, streak resets

// ── Request bounds ────────────────────────────────────────────────────────
pub const MIN_WITHDRAWAL: u64 = 100_000;         // 0.1 Pi
pub const MAX_WITHDRAWAL: u64 = 1_000_000_000;   // 1000 Pi
pub const MIN_PAYMENT:    u64 = 10_000;          // 0.01 Pi
pub const MAX_PAYMENT:    u64 = 10_000_000_000;  // 10000 Pi
pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_MEMO_LEN:     usize = 64;
pub const MAX_TXID_LEN:     usize = 88;

// ── Engagement rewards ────────────────────────────────────────────────────
pub const MIN_ADS_FOR_SPIN: u8 = 3;
pub const S4P_AD_REWARD: u64 = 5_000_000;    // 5 S4P per daily ad claim
// Day 1 through day 7 of the login streak, cycling after day 7.
pub const DAILY_LOGIN_REWARDS: [u64; 7] =
    [10_000, 20_000, 30_000, 50_000, 70_000, 100_000, 150_000];

// ── PDA seeds ─────────────────────────────────────────────────────────────
pub const GLOBAL_STATE_SEED: &[u8] = b"global_state";
pub const PROFILE_SEED:      &[u8] = b"profile";
pub const SPIN_SEED:         &[u8] = b"spin";
pub const PAYMENT_SEED:      &[u8] = b"payment";
pub const WITHDRAWAL_SEED:   &[u8] = b"withdrawal";

// ── Wheel table ───────────────────────────────────────────────────────────
// One uniform roll in [0, 100) walks the cumulative weights in table order;
// the first bucket the roll falls into wins. Weights must sum to exactly 100.
pub const WHEEL: [(SpinResult, u64, u64); 6] = [
    (SpinResult::Lose,         45, 0),
    (SpinResult::WinSmall,     25, WIN_SMALL_REWARD),
    (SpinResult::WinBig,       15, WIN_BIG_REWARD),
    (SpinResult::FreeSpin,      8, 0),
    (SpinResult::NftEntry,      4, 0),
    (SpinResult::JackpotEntry,  3, 0),
];

// ── Achievement catalog ───────────────────────────────────────────────────
// Bit i of Profile.achievements marks catalog entry i as earned. Thresholds
// compare against monotonic profile counters, so a second evaluation with
// no new activity unlocks nothing.
pub const ACHIEVEMENTS: [AchievementDef; 8] = [
    AchievementDef { requirement: Requirement::TotalSpins,    threshold: 1,          reward: 50_000 },
    AchievementDef { requirement: Requirement::TotalSpins,    threshold: 50,         reward: 250_000 },
    AchievementDef { requirement: Requirement::TotalSpins,    threshold: 250,        reward: 1_000_000 },
    AchievementDef { requirement: Requirement::TotalWinnings, threshold: 1_000_000,  reward: 100_000 },
    AchievementDef { requirement: Requirement::TotalWinnings, threshold: 25_000_000, reward: 500_000 },
    AchievementDef { requirement: Requirement::LoginStreak,   threshold: 7,          reward: 250_000 },
    AchievementDef { requirement: Requirement::ReferralCount, threshold: 5,          reward: 500_000 },
    AchievementDef { requirement: Requirement::ReferralCount, threshold: 25,         reward: 2_000_000 },
];

#[program]
pub mod spin4pi {
    use super::*;

    // ── Initialize ────────────────────────────────────────────────
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        let state = &mut ctx.accounts.global_state;
        state.authority           = ctx.accounts.authority.key();
        state.paused              = false;
        state.jackpot_pool        = 0;
        state.jackpot_last_winner = Pubkey::default();
        state.jackpot_last_amount = 0;
        state.total_spins         = 0;
        state.total_wagered       = 0;
        state.bump                = ctx.bumps.global_state;
        Ok(())
    }

    // ── Spin: resolve one wheel turn ──────────────────────────────
    // Receipt insert, profile counters and jackpot accrual all live in one
    // instruction, so either everything lands or the transaction reverts
    // with no partial state.
    pub fn spin(ctx: Context<Spin>, username: String, spin_type: SpinType) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        require!(!ctx.accounts.global_state.paused, SpinError::ContractPaused);

        let player_key = ctx.accounts.player.key();
        let profile = &mut ctx.accounts.profile;
        bind_or_verify_profile(profile, player_key, &username, ctx.bumps.profile)?;
        let profile_key = profile.key();

        let spin_index = profile.total_spins;
        let roll = draw_roll(
            &ctx.accounts.slot_hashes.to_account_info(),
            &profile_key,
            spin_index,
            now,
        )?;

        let (result, reward, jackpot_cut) = settle_spin(profile, spin_type, roll, now)?;

        let state = &mut ctx.accounts.global_state;
        state.jackpot_pool  = state.jackpot_pool.saturating_add(jackpot_cut);
        state.total_wagered = state.total_wagered.saturating_add(spin_cost(spin_type));
        state.total_spins   = state.total_spins.wrapping_add(1);

        let receipt = &mut ctx.accounts.receipt;
        receipt.profile    = profile_key;
        receipt.spin_index = spin_index;
        receipt.spin_type  = spin_type;
        receipt.cost       = spin_cost(spin_type);
        receipt.result     = result;
        receipt.reward     = reward;
        receipt.created_at = now;
        receipt.bump       = ctx.bumps.receipt;

        emit!(SpinSettled {
            profile: profile_key,
            spin_type,
            result,
            cost: receipt.cost,
            reward,
            spin_index,
        });
        Ok(())
    }

    // ── Payment Bridge: approve phase ─────────────────────────────
    // Creates the payment record at Approved. The PDA is derived from the
    // external payment id, so a duplicate submission lands on the same
    // account and is rejected before anything is credited.
    pub fn approve_payment(
        ctx: Context<ApprovePayment>,
        payment_id: String,
        username: String,
        amount: u64,
        memo: String,
    ) -> Result<()> {
        require!(!ctx.accounts.global_state.paused, SpinError::ContractPaused);
        require!(valid_payment_id(&payment_id), SpinError::InvalidPaymentId);
        require!(
            (MIN_PAYMENT..=MAX_PAYMENT).contains(&amount),
            SpinError::AmountOutOfRange
        );
        require!(memo.len() <= MAX_MEMO_LEN, SpinError::MemoTooLong);

        let payer_key = ctx.accounts.payer.key();
        let profile = &mut ctx.accounts.profile;
        bind_or_verify_profile(profile, payer_key, &username, ctx.bumps.profile)?;
        let profile_key = profile.key();

        let payment = &mut ctx.accounts.payment;
        require!(payment.created_at == 0, SpinError::DuplicatePayment);
        payment.id_digest    = payment_id_digest(&payment_id);
        payment.profile      = profile_key;
        payment.amount       = amount;
        payment.status       = PaymentStatus::Approved;
        payment.memo         = memo;
        payment.txid         = String::new();
        payment.created_at   = now_ts()?;
        payment.completed_at = 0;
        payment.bump         = ctx.bumps.payment;

        emit!(PaymentApproved {
            profile: profile_key,
            payment: payment.key(),
            amount,
        });
        Ok(())
    }

    // ── Payment Bridge: complete phase ────────────────────────────
    // Operator-signed, mirroring the provider confirmation callback.
    // Approved → Completed exactly once; a replay rejects with
    // AlreadyCompleted and credits nothing.
    pub fn complete_payment(
        ctx: Context<CompletePayment>,
        _payment_id: String,
        txid: Option<String>,
    ) -> Result<()> {
        let payment = &mut ctx.accounts.payment;
        require!(payment_completable(payment.status), SpinError::AlreadyCompleted);
        let txid = txid.unwrap_or_default();
        require!(txid.len() <= MAX_TXID_LEN, SpinError::TxidTooLong);

        let profile = &mut ctx.accounts.profile;
        profile.balance         = profile.balance.saturating_add(payment.amount);
        profile.total_deposited = profile.total_deposited.saturating_add(payment.amount);

        payment.txid         = txid;
        payment.status       = PaymentStatus::Completed;
        payment.completed_at = now_ts()?;

        emit!(PaymentCompleted {
            profile: profile.key(),
            payment: payment.key(),
            amount: payment.amount,
            new_balance: profile.balance,
        });
        Ok(())
    }

    // ── Withdrawal: request (pessimistic debit) ───────────────────
    // The balance comes off at request time so the same funds cannot back
    // two concurrent withdrawals. fail_withdrawal is the compensating path.
    pub fn request_withdrawal(
        ctx: Context<RequestWithdrawal>,
        _username: String,
        amount: u64,
    ) -> Result<()> {
        let now = now_ts()?;
        let profile = &mut ctx.accounts.profile;
        debit_for_withdrawal(profile, amount)?;
        let profile_key = profile.key();
        let seq = profile.withdrawal_seq;
        profile.withdrawal_seq += 1;
        let new_balance = profile.balance;

        let withdrawal = &mut ctx.accounts.withdrawal;
        withdrawal.profile      = profile_key;
        withdrawal.seq          = seq;
        withdrawal.amount       = amount;
        withdrawal.status       = WithdrawalStatus::Pending;
        withdrawal.txid         = String::new();
        withdrawal.requested_at = now;
        withdrawal.resolved_at  = 0;
        withdrawal.bump         = ctx.bumps.withdrawal;

        emit!(WithdrawalRequested {
            profile: profile_key,
            withdrawal: withdrawal.key(),
            amount,
            new_balance,
        });
        Ok(())
    }

    // ── Withdrawal: operator confirms the external transfer ───────
    pub fn complete_withdrawal(ctx: Context<ResolveWithdrawal>, txid: String) -> Result<()> {
        require!(txid.len() <= MAX_TXID_LEN, SpinError::TxidTooLong);
        let withdrawal = &mut ctx.accounts.withdrawal;
        require!(
            withdrawal.status == WithdrawalStatus::Pending,
            SpinError::WithdrawalNotPending
        );
        withdrawal.status      = WithdrawalStatus::Completed;
        withdrawal.txid        = txid;
        withdrawal.resolved_at = now_ts()?;

        emit!(WithdrawalCompleted {
            withdrawal: withdrawal.key(),
            amount: withdrawal.amount,
        });
        Ok(())
    }

    // ── Withdrawal: external transfer failed, credit back ─────────
    pub fn fail_withdrawal(ctx: Context<ResolveWithdrawal>) -> Result<()> {
        let withdrawal = &mut ctx.accounts.withdrawal;
        require!(
            withdrawal.status == WithdrawalStatus::Pending,
            SpinError::WithdrawalNotPending
        );
        let profile = &mut ctx.accounts.profile;
        profile.balance = profile.balance.saturating_add(withdrawal.amount);

        withdrawal.status      = WithdrawalStatus::Failed;
        withdrawal.resolved_at = now_ts()?;

        emit!(WithdrawalFailed {
            withdrawal: withdrawal.key(),
            amount: withdrawal.amount,
            new_balance: profile.balance,
        });
        Ok(())
    }

    // ── Daily login: streak reward ────────────────────────────────
    // A claim inside the 24h window is not an error; the event carries the
    // already_claimed flag so the client can self-correct.
    pub fn daily_login(ctx: Context<DailyLogin>, username: String) -> Result<()> {
        let now = now_ts()?;
        let player_key = ctx.accounts.player.key();
        let profile = &mut ctx.accounts.profile;
        bind_or_verify_profile(profile, player_key, &username, ctx.bumps.profile)?;
        let profile_key = profile.key();

        match settle_daily_login(profile, now) {
            Some((reward, streak, day)) => {
                emit!(DailyLoginClaimed {
                    profile: profile_key,
                    already_claimed: false,
                    reward,
                    streak,
                    streak_day: day,
                });
            }
            None => {
                msg!("Daily reward already claimed in this window");
                emit!(DailyLoginClaimed {
                    profile: profile_key,
                    already_claimed: true,
                    reward: 0,
                    streak: profile.login_streak,
                    streak_day: streak_day(profile.login_streak),
                });
            }
        }
        Ok(())
    }

    // ── Ad spin: bank a free spin for watched ads ─────────────────
    pub fn claim_ad_spin(
        ctx: Context<ClaimAdSpin>,
        _username: String,
        ads_watched: u8,
    ) -> Result<()> {
        let now = now_ts()?;
        require!(ads_watched >= MIN_ADS_FOR_SPIN, SpinError::BelowMinimumAds);

        let profile = &mut ctx.accounts.profile;
        require!(
            profile.last_ad_claim == 0 || now - profile.last_ad_claim >= DAY_SECS,
            SpinError::AlreadyClaimedToday
        );
        profile.last_ad_claim = now;
        profile.bonus_spins   = profile.bonus_spins.saturating_add(1);
        profile.s4p_balance   = profile.s4p_balance.saturating_add(S4P_AD_REWARD);

        emit!(AdSpinClaimed {
            profile: profile.key(),
            ads_watched,
            s4p_reward: S4P_AD_REWARD,
        });
        Ok(())
    }

    // ── Achievements: evaluate the catalog ────────────────────────
    pub fn check_achievements(ctx: Context<CheckAchievements>, _username: String) -> Result<()> {
        let profile = &mut ctx.accounts.profile;
        let (count, total_reward) = apply_achievements(profile);

        emit!(AchievementsChecked {
            profile: profile.key(),
            newly_unlocked: count,
            total_reward,
        });
        Ok(())
    }

    // ── Referrals: one-shot link to a referrer ────────────────────
    pub fn register_referral(
        ctx: Context<RegisterReferral>,
        _username: String,
        _referrer_username: String,
    ) -> Result<()> {
        let referrer_key = ctx.accounts.referrer_profile.key();
        let referee_key = ctx.accounts.profile.key();
        require!(referee_key != referrer_key, SpinError::SelfReferral);

        let referee = &mut ctx.accounts.profile;
        require!(
            referee.referred_by == Pubkey::default(),
            SpinError::AlreadyReferred
        );
        referee.referred_by = referrer_key;

        let referrer = &mut ctx.accounts.referrer_profile;
        referrer.referral_count = referrer.referral_count.saturating_add(1);

        emit!(ReferralRegistered {
            referee: referee_key,
            referrer: referrer_key,
        });
        Ok(())
    }

    // ── Admin: circuit breaker ────────────────────────────────────
    pub fn set_paused(ctx: Context<AdminOnly>, paused: bool) -> Result<()> {
        ctx.accounts.global_state.paused = paused;
        Ok(())
    }

    // ── Admin: award and reset the jackpot pool ───────────────────
    // The only path that drains the pool; the spin path only accrues.
    pub fn award_jackpot(ctx: Context<AwardJackpot>) -> Result<()> {
        let state = &mut ctx.accounts.global_state;
        require!(state.jackpot_pool > 0, SpinError::JackpotEmpty);

        let amount = state.jackpot_pool;
        let profile = &mut ctx.accounts.profile;
        profile.balance        = profile.balance.saturating_add(amount);
        profile.total_winnings = profile.total_winnings.saturating_add(amount);
        let winner = profile.key();

        state.jackpot_pool        = 0;
        state.jackpot_last_winner = winner;
        state.jackpot_last_amount = amount;

        emit!(JackpotAwarded {
            profile: winner,
            amount,
        });
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════
//  HELPERS
// ══════════════════════════════════════════════════════════════════════════

fn now_ts() -> Result<i64> {
    Ok(Clock::get()?.unix_timestamp)
}

/// Binds a fresh profile to the signing wallet, or verifies an existing one.
/// The wallet bound at first touch is the only signer that may mutate this
/// username's ledger row afterwards.
fn bind_or_verify_profile(
    profile: &mut Profile,
    signer: Pubkey,
    username: &str,
    bump: u8,
) -> Result<()> {
    require!(valid_username(username), SpinError::InvalidUsername);
    if profile.authority == Pubkey::default() {
        profile.authority = signer;
        profile.username = username.to_string();
        profile.bump = bump;
        msg!("Profile created for {}", username);
    } else {
        require!(profile.authority == signer, SpinError::UsernameMismatch);
    }
    Ok(())
}

/// Price table per spin type.
pub fn spin_cost(spin_type: SpinType) -> u64 {
    match spin_type {
        SpinType::Free  => 0,
        SpinType::Basic => BASIC_SPIN_COST,
        SpinType::Pro   => PRO_SPIN_COST,
        SpinType::Vault => VAULT_SPIN_COST,
    }
}

/// Walks the cumulative wheel table. `roll` must be in [0, 100); ties break
/// in table order by construction.
pub fn resolve_wheel(roll: u64) -> (SpinResult, u64) {
    let mut cumulative = 0u64;
    for &(result, weight, reward) in WHEEL.iter() {
        cumulative += weight;
        if roll < cumulative {
            return (result, reward);
        }
    }
    // Unreachable while the weights sum to 100 and roll < 100.
    (SpinResult::Lose, 0)
}

/// Share of a paid-spin cost accrued into the jackpot pool.
pub fn jackpot_contribution(cost: u64) -> u64 {
    cost.saturating_mul(JACKPOT_BPS) / 10_000
}

/// Seconds until the next free spin is allowed; 0 when ready.
/// last_free_spin == 0 means the profile has never free-spun.
pub fn free_spin_wait_secs(last_free_spin: i64, now: i64) -> i64 {
    if last_free_spin == 0 {
        return 0;
    }
    let ready_at = last_free_spin + FREE_SPIN_COOLDOWN_SECS;
    if now >= ready_at { 0 } else { ready_at - now }
}

/// Core spin state transition: eligibility, pricing, outcome application.
/// Returns (result, reward credited, jackpot contribution owed). On error
/// nothing has been applied to the profile.
pub fn settle_spin(
    profile: &mut Profile,
    spin_type: SpinType,
    roll: u64,
    now: i64,
) -> Result<(SpinResult, u64, u64)> {
    let cost = spin_cost(spin_type);
    let mut jackpot_cut = 0u64;

    if spin_type == SpinType::Free {
        // A banked bonus spin bypasses the cooldown without consuming it.
        if profile.bonus_spins > 0 {
            profile.bonus_spins -= 1;
        } else {
            let wait = free_spin_wait_secs(profile.last_free_spin, now);
            if wait > 0 {
                msg!("Free spin ready in {}s", wait);
                return err!(SpinError::FreeSpinNotReady);
            }
            profile.last_free_spin = now;
        }
    } else {
        require!(profile.balance >= cost, SpinError::InsufficientBalance);
        profile.balance -= cost;
        profile.total_wagered = profile.total_wagered.saturating_add(cost);
        jackpot_cut = jackpot_contribution(cost);
    }

    let (result, reward) = resolve_wheel(roll);
    match result {
        SpinResult::FreeSpin => profile.bonus_spins = profile.bonus_spins.saturating_add(1),
        SpinResult::NftEntry => profile.nft_entries = profile.nft_entries.saturating_add(1),
        SpinResult::JackpotEntry => {
            profile.jackpot_entries = profile.jackpot_entries.saturating_add(1)
        }
        _ => {}
    }
    if reward > 0 {
        profile.balance = profile.balance.saturating_add(reward);
        profile.total_winnings = profile.total_winnings.saturating_add(reward);
    }
    profile.total_spins += 1;

    Ok((result, reward, jackpot_cut))
}

/// Validates bounds and debits the balance for a withdrawal request.
pub fn debit_for_withdrawal(profile: &mut Profile, amount: u64) -> Result<()> {
    require!(
        (MIN_WITHDRAWAL..=MAX_WITHDRAWAL).contains(&amount),
        SpinError::AmountOutOfRange
    );
    require!(profile.balance >= amount, SpinError::InsufficientBalance);
    profile.balance -= amount;
    Ok(())
}

/// A payment is completable exactly once, from Approved.
pub fn payment_completable(status: PaymentStatus) -> bool {
    status == PaymentStatus::Approved
}

/// Applies the daily-login claim. Returns None inside the 24h window
/// (already claimed, not an error), otherwise (reward, streak, streak day).
pub fn settle_daily_login(profile: &mut Profile, now: i64) -> Option<(u64, u32, u8)> {
    let streak = advance_streak(profile.last_login, now, profile.login_streak)?;
    let day = streak_day(streak);
    let reward = DAILY_LOGIN_REWARDS[(day - 1) as usize];

    profile.last_login = now;
    profile.login_streak = streak;
    profile.balance = profile.balance.saturating_add(reward);
    Some((reward, streak, day))
}

/// Streak bookkeeping: None while the 24h window is still open, streak + 1
/// inside the 48h grace window, otherwise back to day 1.
pub fn advance_streak(last_login: i64, now: i64, streak: u32) -> Option<u32> {
    if last_login == 0 {
        return Some(1);
    }
    let elapsed = now - last_login;
    if elapsed < DAY_SECS {
        None
    } else if elapsed < STREAK_GRACE_SECS {
        Some(streak.saturating_add(1))
    } else {
        Some(1)
    }
}

/// Position in the 7-day reward cycle for a given streak count.
pub fn streak_day(streak: u32) -> u8 {
    if streak == 0 {
        return 1;
    }
    ((streak - 1) % 7 + 1) as u8
}

/// Evaluates the catalog against the profile counters and records every
/// newly met achievement exactly once, crediting its reward. Idempotent:
/// a second run with unchanged counters is a no-op.
pub fn apply_achievements(profile: &mut Profile) -> (u8, u64) {
    let mut count = 0u8;
    let mut total_reward = 0u64;

    for (i, def) in ACHIEVEMENTS.iter().enumerate() {
        let bit = 1u16 << i;
        if profile.achievements & bit != 0 {
            continue;
        }
        let counter = match def.requirement {
            Requirement::TotalSpins    => profile.total_spins,
            Requirement::TotalWinnings => profile.total_winnings,
            Requirement::LoginStreak   => profile.login_streak as u64,
            Requirement::ReferralCount => profile.referral_count as u64,
        };
        if counter >= def.threshold {
            profile.achievements |= bit;
            total_reward = total_reward.saturating_add(def.reward);
            count += 1;
        }
    }

    if total_reward > 0 {
        profile.balance = profile.balance.saturating_add(total_reward);
        profile.total_winnings = profile.total_winnings.saturating_add(total_reward);
    }
    (count, total_reward)
}

/// Canonical usernames: 3-32 chars of [a-z0-9_]. Uppercase input is rejected
/// rather than folded so one identity cannot claim two profile rows.
pub fn valid_username(s: &str) -> bool {
    (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&s.len())
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// External payment ids are UUIDs: 36 chars, hyphens at 8/13/18/23.
pub fn valid_payment_id(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, &c) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if c != b'-' {
                    return false;
                }
            }
            _ => {
                if !c.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// 32-byte PDA seed for an external payment id. UUIDs are longer than the
/// seed limit, so the id is digested; the digest also backs the uniqueness
/// guarantee of one account per external id.
pub fn payment_id_digest(payment_id: &str) -> [u8; 32] {
    *blake3::hash(payment_id.as_bytes()).as_bytes()
}

/// Blake3 roll extraction from the newest SlotHashes entry, mixed with the
/// profile key, spin index and clock so two profiles spinning in the same
/// slot draw independently.
fn draw_roll(
    slot_hashes_ai: &AccountInfo,
    profile: &Pubkey,
    spin_index: u64,
    now: i64,
) -> Result<u64> {
    let data = slot_hashes_ai.data.borrow();
    let n = u64::from_le_bytes(data[0..8].try_into().unwrap()) as usize;
    require!(n > 0, SpinError::SlotHashUnavailable);
    // Entries are (slot: u64, hash: [u8; 32]), newest first.
    let newest: [u8; 32] = data[16..48].try_into().unwrap();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&newest);
    hasher.update(profile.as_ref());
    hasher.update(&spin_index.to_le_bytes());
    hasher.update(&now.to_le_bytes());
    let digest = hasher.finalize();

    let raw = u64::from_le_bytes(digest.as_bytes()[0..8].try_into().unwrap());
    Ok(raw % 100)
}

// ══════════════════════════════════════════════════════════════════════════
//  ACCOUNTS
// ══════════════════════════════════════════════════════════════════════════

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(init, payer = authority, space = 8 + GlobalState::LEN,
              seeds = [GLOBAL_STATE_SEED], bump)]
    pub global_state: Account<'info, GlobalState>,
    #[account(mut)] pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(username: String)]
pub struct Spin<'info> {
    #[account(mut)] pub player: Signer<'info>,
    #[account(mut, seeds = [GLOBAL_STATE_SEED], bump = global_state.bump)]
    pub global_state: Account<'info, GlobalState>,
    #[account(init_if_needed, payer = player, space = 8 + Profile::LEN,
              seeds = [PROFILE_SEED, username.as_bytes()], bump)]
    pub profile: Account<'info, Profile>,
    #[account(init, payer = player, space = 8 + SpinReceipt::LEN,
              seeds = [SPIN_SEED, profile.key().as_ref(),
                       &profile.total_spins.to_le_bytes()],
              bump)]
    pub receipt: Account<'info, SpinReceipt>,
    /// CHECK: address constrained to the SlotHashes sysvar
    #[account(address = slot_hashes::ID)]
    pub slot_hashes: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(payment_id: String, username: String)]
pub struct ApprovePayment<'info> {
    #[account(mut)] pub payer: Signer<'info>,
    #[account(seeds = [GLOBAL_STATE_SEED], bump = global_state.bump)]
    pub global_state: Account<'info, GlobalState>,
    #[account(init_if_needed, payer = payer, space = 8 + Profile::LEN,
              seeds = [PROFILE_SEED, username.as_bytes()], bump)]
    pub profile: Account<'info, Profile>,
    #[account(init_if_needed, payer = payer, space = 8 + Payment::LEN,
              seeds = [PAYMENT_SEED, &payment_id_digest(&payment_id)], bump)]
    pub payment: Account<'info, Payment>,
    pub system_program: Program<'info, System>,
}

/// Completion is operator-signed: it models the external payment provider's
/// confirmation callback, not a user action.
#[derive(Accounts)]
#[instruction(payment_id: String)]
pub struct CompletePayment<'info> {
    #[account(seeds = [GLOBAL_STATE_SEED], bump = global_state.bump,
              has_one = authority)]
    pub global_state: Account<'info, GlobalState>,
    pub authority: Signer<'info>,
    #[account(mut, seeds = [PAYMENT_SEED, &payment_id_digest(&payment_id)],
              bump = payment.bump)]
    pub payment: Account<'info, Payment>,
    #[account(mut, address = payment.profile)]
    pub profile: Account<'info, Profile>,
}

#[derive(Accounts)]
#[instruction(username: String)]
pub struct RequestWithdrawal<'info> {
    #[account(mut)] pub player: Signer<'info>,
    #[account(mut, seeds = [PROFILE_SEED, username.as_bytes()], bump = profile.bump,
              constraint = profile.authority == player.key() @ SpinError::UsernameMismatch)]
    pub profile: Account<'info, Profile>,
    #[account(init, payer = player, space = 8 + Withdrawal::LEN,
              seeds = [WITHDRAWAL_SEED, profile.key().as_ref(),
                       &profile.withdrawal_seq.to_le_bytes()],
              bump)]
    pub withdrawal: Account<'info, Withdrawal>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct ResolveWithdrawal<'info> {
    #[account(seeds = [GLOBAL_STATE_SEED], bump = global_state.bump,
              has_one = authority)]
    pub global_state: Account<'info, GlobalState>,
    pub authority: Signer<'info>,
    #[account(mut)]
    pub withdrawal: Account<'info, Withdrawal>,
    #[account(mut, address = withdrawal.profile)]
    pub profile: Account<'info, Profile>,
}

#[derive(Accounts)]
#[instruction(username: String)]
pub struct DailyLogin<'info> {
    #[account(mut)] pub player: Signer<'info>,
    #[account(init_if_needed, payer = player, space = 8 + Profile::LEN,
              seeds = [PROFILE_SEED, username.as_bytes()], bump)]
    pub profile: Account<'info, Profile>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(username: String)]
pub struct ClaimAdSpin<'info> {
    pub player: Signer<'info>,
    #[account(mut, seeds = [PROFILE_SEED, username.as_bytes()], bump = profile.bump,
              constraint = profile.authority == player.key() @ SpinError::UsernameMismatch)]
    pub profile: Account<'info, Profile>,
}

#[derive(Accounts)]
#[instruction(username: String)]
pub struct CheckAchievements<'info> {
    pub player: Signer<'info>,
    #[account(mut, seeds = [PROFILE_SEED, username.as_bytes()], bump = profile.bump,
              constraint = profile.authority == player.key() @ SpinError::UsernameMismatch)]
    pub profile: Account<'info, Profile>,
}

#[derive(Accounts)]
#[instruction(username: String, referrer_username: String)]
pub struct RegisterReferral<'info> {
    pub player: Signer<'info>,
    #[account(mut, seeds = [PROFILE_SEED, username.as_bytes()], bump = profile.bump,
              constraint = profile.authority == player.key() @ SpinError::UsernameMismatch)]
    pub profile: Account<'info, Profile>,
    #[account(mut, seeds = [PROFILE_SEED, referrer_username.as_bytes()],
              bump = referrer_profile.bump)]
    pub referrer_profile: Account<'info, Profile>,
}

#[derive(Accounts)]
pub struct AdminOnly<'info> {
    #[account(mut, seeds = [GLOBAL_STATE_SEED], bump = global_state.bump,
              has_one = authority)]
    pub global_state: Account<'info, GlobalState>,
    #[account(mut)] pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct AwardJackpot<'info> {
    #[account(mut, seeds = [GLOBAL_STATE_SEED], bump = global_state.bump,
              has_one = authority)]
    pub global_state: Account<'info, GlobalState>,
    #[account(mut)] pub authority: Signer<'info>,
    #[account(mut)]
    pub profile: Account<'info, Profile>,
}

// ══════════════════════════════════════════════════════════════════════════
//  STATE
// ══════════════════════════════════════════════════════════════════════════

#[account]
pub struct GlobalState {
    pub authority:           Pubkey,  // 32
    pub paused:              bool,    // 1
    pub jackpot_pool:        u64,     // 8
    pub jackpot_last_winner: Pubkey,  // 32
    pub jackpot_last_amount: u64,     // 8
    // ── Transparency counters ──
    pub total_spins:         u64,     // 8
    pub total_wagered:       u64,     // 8
    pub bump:                u8,      // 1
}
impl GlobalState { pub const LEN: usize = 32 + 1 + 8 + 32 + 8 + 8 + 8 + 1; }

/// One ledger row per Pi Network username. The PDA seed makes the username
/// the immutable unique key; authority is the wallet bound at first touch.
#[account]
#[derive(Default)]
pub struct Profile {
    pub authority:       Pubkey,  // 32
    pub username:        String,  // 4 + 32
    pub balance:         u64,     // 8  — uPi, never negative by construction
    pub s4p_balance:     u64,     // 8  — uS4P secondary token
    pub total_spins:     u64,     // 8  — equals the number of SpinReceipts
    pub total_winnings:  u64,     // 8
    pub total_wagered:   u64,     // 8
    pub total_deposited: u64,     // 8
    pub bonus_spins:     u32,     // 4  — banked free spins (ads, wheel)
    pub nft_entries:     u32,     // 4
    pub jackpot_entries: u32,     // 4
    pub last_free_spin:  i64,     // 8  — 0 = never
    pub last_login:      i64,     // 8
    pub login_streak:    u32,     // 4
    pub last_ad_claim:   i64,     // 8
    pub referred_by:     Pubkey,  // 32 — default = not referred
    pub referral_count:  u32,     // 4
    pub achievements:    u16,     // 2  — earned bitmask over ACHIEVEMENTS
    pub withdrawal_seq:  u64,     // 8
    pub bump:            u8,      // 1
}
impl Profile {
    pub const LEN: usize =
        32 + (4 + 32) + 8 + 8 + 8 + 8 + 8 + 8 + 4 + 4 + 4 + 8 + 8 + 4 + 8 + 32 + 4 + 2 + 8 + 1;
}

/// Append-only record of one wheel resolution. Never mutated after insert;
/// the seed ties it to the profile's spin index.
#[account]
pub struct SpinReceipt {
    pub profile:    Pubkey,      // 32
    pub spin_index: u64,         // 8
    pub spin_type:  SpinType,    // 1
    pub cost:       u64,         // 8
    pub result:     SpinResult,  // 1
    pub reward:     u64,         // 8
    pub created_at: i64,         // 8
    pub bump:       u8,          // 1
}
impl SpinReceipt { pub const LEN: usize = 32 + 8 + 1 + 8 + 1 + 8 + 8 + 1; }

#[account]
pub struct Payment {
    pub id_digest:    [u8; 32],       // 32 — blake3 of the external id
    pub profile:      Pubkey,         // 32
    pub amount:       u64,            // 8
    pub status:       PaymentStatus,  // 1
    pub memo:         String,         // 4 + 64
    pub txid:         String,         // 4 + 88
    pub created_at:   i64,            // 8  — 0 only before approval
    pub completed_at: i64,            // 8
    pub bump:         u8,             // 1
}
impl Payment {
    pub const LEN: usize = 32 + 32 + 8 + 1 + (4 + 64) + (4 + 88) + 8 + 8 + 1;
}

#[account]
pub struct Withdrawal {
    pub profile:      Pubkey,            // 32
    pub seq:          u64,               // 8
    pub amount:       u64,               // 8
    pub status:       WithdrawalStatus,  // 1
    pub txid:         String,            // 4 + 88
    pub requested_at: i64,               // 8
    pub resolved_at:  i64,               // 8
    pub bump:         u8,                // 1
}
impl Withdrawal {
    pub const LEN: usize = 32 + 8 + 8 + 1 + (4 + 88) + 8 + 8 + 1;
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpinType {
    Free,
    Basic,
    Pro,
    Vault,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpinResult {
    Lose,
    WinSmall,
    WinBig,
    FreeSpin,
    NftEntry,
    JackpotEntry,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaymentStatus {
    Approved,
    Completed,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum WithdrawalStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Clone, Copy, Debug)]
pub enum Requirement {
    TotalSpins,
    TotalWinnings,
    LoginStreak,
    ReferralCount,
}

pub struct AchievementDef {
    pub requirement: Requirement,
    pub threshold:   u64,
    pub reward:      u64,
}

// ══════════════════════════════════════════════════════════════════════════
//  ERRORS & EVENTS
// ══════════════════════════════════════════════════════════════════════════

#[error_code]
pub enum SpinError {
    #[msg("Contract is paused")]
    ContractPaused,
    #[msg("Invalid username (3-32 chars, lowercase alphanumeric/underscore)")]
    InvalidUsername,
    #[msg("Signer does not own this username")]
    UsernameMismatch,
    #[msg("Free spin cooldown active")]
    FreeSpinNotReady,
    #[msg("Insufficient wallet balance")]
    InsufficientBalance,
    #[msg("Amount out of allowed range")]
    AmountOutOfRange,
    #[msg("Invalid payment id (expected UUID)")]
    InvalidPaymentId,
    #[msg("Memo too long (max 64 bytes)")]
    MemoTooLong,
    #[msg("Transaction id too long (max 88 bytes)")]
    TxidTooLong,
    #[msg("Payment id already processed")]
    DuplicatePayment,
    #[msg("Payment already completed")]
    AlreadyCompleted,
    #[msg("Withdrawal is not pending")]
    WithdrawalNotPending,
    #[msg("Below minimum ads watched (min 3)")]
    BelowMinimumAds,
    #[msg("Already claimed in this 24h window")]
    AlreadyClaimedToday,
    #[msg("Referrer already recorded")]
    AlreadyReferred,
    #[msg("Cannot refer yourself")]
    SelfReferral,
    #[msg("Slot hashes sysvar is empty")]
    SlotHashUnavailable,
    #[msg("Jackpot pool is empty")]
    JackpotEmpty,
}

#[event] pub struct SpinSettled         { pub profile: Pubkey, pub spin_type: SpinType, pub result: SpinResult, pub cost: u64, pub reward: u64, pub spin_index: u64 }
#[event] pub struct PaymentApproved     { pub profile: Pubkey, pub payment: Pubkey, pub amount: u64 }
#[event] pub struct PaymentCompleted    { pub profile: Pubkey, pub payment: Pubkey, pub amount: u64, pub new_balance: u64 }
#[event] pub struct WithdrawalRequested { pub profile: Pubkey, pub withdrawal: Pubkey, pub amount: u64, pub new_balance: u64 }
#[event] pub struct WithdrawalCompleted { pub withdrawal: Pubkey, pub amount: u64 }
#[event] pub struct WithdrawalFailed    { pub withdrawal: Pubkey, pub amount: u64, pub new_balance: u64 }
#[event] pub struct DailyLoginClaimed   { pub profile: Pubkey, pub already_claimed: bool, pub reward: u64, pub streak: u32, pub streak_day: u8 }
#[event] pub struct AdSpinClaimed       { pub profile: Pubkey, pub ads_watched: u8, pub s4p_reward: u64 }
#[event] pub struct AchievementsChecked { pub profile: Pubkey, pub newly_unlocked: u8, pub total_reward: u64 }
#[event] pub struct ReferralRegistered  { pub referee: Pubkey, pub referrer: Pubkey }
#[event] pub struct JackpotAwarded      { pub profile: Pubkey, pub amount: u64 }
